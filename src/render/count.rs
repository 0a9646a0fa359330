use std::io::Write;

use super::{Render, RenderState};
use crate::{diff::DiffOp, err::Result};

/// Counts operations without looking at their bytes.
#[derive(Debug, Default)]
pub struct CountRenderer;

impl Render for CountRenderer {
    fn render(&mut self, _op: &DiffOp<'_>, state: &mut RenderState, _out: &mut dyn Write) -> Result<()> {
        state.count += 1;
        Ok(())
    }
}
