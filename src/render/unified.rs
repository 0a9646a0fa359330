use std::io::Write;

use super::{Render, RenderState};
use crate::{
    diff::DiffOp,
    err::Result,
    palette::Palette,
    util::{c_text, escape_bytes, hex_pairs},
};

/// Longest prefix of a span that is read back as text.
const TEXT_MAX: usize = 256;

/// `-`/`+` lines for each side whose bytes read as a non-empty string.
#[derive(Debug)]
pub struct UnifiedRenderer {
    palette: Palette,
    quiet: bool,
}

impl UnifiedRenderer {
    pub fn new(palette: Palette, quiet: bool) -> Self {
        Self { palette, quiet }
    }

    fn write_side(&self, sign: char, offset: u64, bytes: &[u8], out: &mut dyn Write) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let text = c_text(bytes, TEXT_MAX);
        if text.is_empty() {
            return Ok(());
        }
        let mut line = format!("{}0x{:08x}:{}", sign, offset, hex_pairs(bytes, " "));
        if !self.quiet {
            line.push_str(&format!(" \"{}\"", escape_bytes(text)));
        }
        let line = match sign {
            '-' => self.palette.red(&line),
            _ => self.palette.green(&line),
        };
        writeln!(out, "{}", line)?;
        Ok(())
    }
}

impl Render for UnifiedRenderer {
    fn render(&mut self, op: &DiffOp<'_>, _state: &mut RenderState, out: &mut dyn Write) -> Result<()> {
        self.write_side('-', op.source_offset, op.source, out)?;
        self.write_side('+', op.target_offset, op.target, out)
    }
}
