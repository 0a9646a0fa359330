use std::io::Write;

use super::{Inputs, Render, RenderState};
use crate::{diff::DiffOp, err::Result, gdiff::Encoder};

/// Writes a GDIFF patch. Never stops between operations: a patch cut short
/// would still look complete to a reader.
#[derive(Debug)]
pub struct GdiffRenderer {
    encoder: Encoder,
    tail: bool,
}

impl GdiffRenderer {
    pub fn new(tail: bool) -> Self {
        Self {
            encoder: Encoder::new(),
            tail,
        }
    }
}

impl Render for GdiffRenderer {
    fn begin(&mut self, _inputs: &Inputs<'_>, out: &mut dyn Write) -> Result<()> {
        self.encoder.write_header(out)?;
        Ok(())
    }

    fn render(&mut self, op: &DiffOp<'_>, _state: &mut RenderState, out: &mut dyn Write) -> Result<()> {
        self.encoder.write_op(op, out)?;
        Ok(())
    }

    fn finish(&mut self, inputs: &Inputs<'_>, out: &mut dyn Write) -> Result<()> {
        if self.tail {
            self.encoder
                .write_tail(inputs.old.bytes.len() as u64, out)?;
        }
        self.encoder.write_end(out)?;
        Ok(())
    }

    fn cancellable(&self) -> bool {
        false
    }
}
