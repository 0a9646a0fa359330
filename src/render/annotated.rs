use std::io::Write;

use super::{Render, RenderState};
use crate::{
    diff::DiffOp,
    disasm::{DisasmBackend, Disassembler, Side},
    err::Result,
    palette::Palette,
};

enum Slot {
    Unopened,
    Ready(Box<dyn Disassembler>),
    Failed,
}

struct Disasm<'d> {
    backend: Box<dyn DisasmBackend + 'd>,
    source: Slot,
    target: Slot,
}

impl<'d> Disasm<'d> {
    /// Instruction lines for `bytes`, or the bytes as hex if no disassembler
    /// can be had for this side.
    fn lines(&mut self, side: Side, bytes: &[u8]) -> Vec<String> {
        let slot = match side {
            Side::Source => &mut self.source,
            Side::Target => &mut self.target,
        };
        if let Slot::Unopened = slot {
            *slot = match self.backend.open(side) {
                Ok(disassembler) => {
                    log::debug!("opened {} disassembler", side);
                    Slot::Ready(disassembler)
                }
                Err(e) => {
                    log::warn!("{}, showing {} bytes as hex", e, side);
                    Slot::Failed
                }
            };
        }
        if let Slot::Ready(disassembler) = slot {
            match disassembler.disassemble(bytes) {
                Ok(lines) => return lines,
                Err(e) => log::warn!("cannot disassemble {} bytes: {}", side, e),
            }
        }
        if bytes.is_empty() {
            Vec::new()
        } else {
            vec![hex::encode(bytes)]
        }
    }
}

/// The default output: offsets and hex of both sides on one line, or, with a
/// disassembler, a `---`/`+++` block per side.
pub struct AnnotatedRenderer<'d> {
    palette: Palette,
    disasm: Option<Disasm<'d>>,
}

impl<'d> AnnotatedRenderer<'d> {
    pub fn new() -> Self {
        Self {
            palette: Palette::plain(),
            disasm: None,
        }
    }

    pub fn with_disasm(palette: Palette, backend: Box<dyn DisasmBackend + 'd>) -> Self {
        Self {
            palette,
            disasm: Some(Disasm {
                backend,
                source: Slot::Unopened,
                target: Slot::Unopened,
            }),
        }
    }
}

impl Default for AnnotatedRenderer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Render for AnnotatedRenderer<'_> {
    fn render(&mut self, op: &DiffOp<'_>, _state: &mut RenderState, out: &mut dyn Write) -> Result<()> {
        let Some(disasm) = &mut self.disasm else {
            writeln!(
                out,
                "0x{:08x} {} => {} 0x{:08x}",
                op.source_offset,
                hex::encode(op.source),
                hex::encode(op.target),
                op.target_offset
            )?;
            return Ok(());
        };

        writeln!(out, "--- 0x{:08x}  {}", op.source_offset, hex::encode(op.source))?;
        for line in disasm.lines(Side::Source, op.source) {
            writeln!(out, "{}", self.palette.red(&format!("- {}", line)))?;
        }
        writeln!(out, "+++ 0x{:08x}  {}", op.target_offset, hex::encode(op.target))?;
        for line in disasm.lines(Side::Target, op.target) {
            writeln!(out, "{}", self.palette.green(&format!("+ {}", line)))?;
        }
        Ok(())
    }
}
