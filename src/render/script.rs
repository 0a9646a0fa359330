use std::io::Write;

use super::{Render, RenderState};
use crate::{diff::DiffOp, err::Result};

/// Commands that replay the change on a single address space: `wx` writes
/// bytes, `r-`/`r+` shrink or grow the space at an address.
///
/// `delta` is the drift caused by earlier size changes. It is accumulated from
/// the raw offsets of each resized operation and applied to the offsets of the
/// following ones.
#[derive(Debug, Default)]
pub struct ScriptRenderer {
    delta: i64,
}

impl ScriptRenderer {
    pub fn new(disasm: bool) -> Self {
        if disasm {
            log::warn!("script output ignores disassembly");
        }
        Self { delta: 0 }
    }

    fn shifted(&self, offset: u64) -> u64 {
        offset.wrapping_add_signed(self.delta)
    }
}

impl Render for ScriptRenderer {
    fn render(&mut self, op: &DiffOp<'_>, _state: &mut RenderState, out: &mut dyn Write) -> Result<()> {
        if op.source.len() == op.target.len() {
            writeln!(
                out,
                "wx {} @ 0x{:08x}",
                hex::encode(op.target),
                op.target_offset
            )?;
            return Ok(());
        }
        if !op.source.is_empty() {
            writeln!(
                out,
                "r-{} @ 0x{:08x}",
                op.source.len(),
                self.shifted(op.source_offset)
            )?;
        }
        if !op.target.is_empty() {
            let offset = self.shifted(op.target_offset);
            writeln!(out, "r+{} @ 0x{:08x}", op.target.len(), offset)?;
            writeln!(out, "wx {} @ 0x{:08x}", hex::encode(op.target), offset)?;
        }
        self.delta += op.target_offset as i64 - op.source_offset as i64;
        Ok(())
    }
}
