use std::io::Write;

use super::{Render, RenderState};
use crate::{diff::DiffOp, err::Result};

/// One `{"offset","from","to"}` object per operation. The surrounding array
/// is opened and closed by the dispatcher.
#[derive(Debug, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    pub fn new(disasm: bool) -> Self {
        if disasm {
            log::warn!("JSON output ignores disassembly");
        }
        Self
    }
}

impl Render for JsonRenderer {
    fn render(&mut self, op: &DiffOp<'_>, state: &mut RenderState, out: &mut dyn Write) -> Result<()> {
        if state.started {
            writeln!(out, ",")?;
        }
        state.started = true;
        write!(
            out,
            "{{\"offset\":{},\"from\":\"{}\",\"to\":\"{}\"}}",
            op.source_offset,
            hex::encode(op.source),
            hex::encode(op.target)
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elements_are_comma_joined() {
        let ops = [
            DiffOp {
                source_offset: 1,
                source: b"\x00",
                target_offset: 1,
                target: b"\xff",
            },
            DiffOp {
                source_offset: 9,
                source: b"",
                target_offset: 9,
                target: b"ab",
            },
        ];
        let mut renderer = JsonRenderer::new(false);
        let mut state = RenderState::default();
        let mut out = Vec::new();
        for op in &ops {
            renderer.render(op, &mut state, &mut out).unwrap();
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"offset\":1,\"from\":\"00\",\"to\":\"ff\"},\n{\"offset\":9,\"from\":\"\",\"to\":\"6162\"}"
        );
    }
}
