use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// An input buffer could not be loaded. Always fatal.
    #[error("cannot read {}: {source}", path.display())]
    Input { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid column width {0}, expected 8 or 16")]
    ColumnWidth(usize),

    /// An optional rendering backend could not be used.
    #[error("disassembly backend unavailable: {0}")]
    Backend(String),

    #[error("malformed patch at byte {offset}: {reason}")]
    Patch { offset: usize, reason: String },
}

impl Error {
    pub fn patch(offset: usize, reason: impl Into<String>) -> Self {
        Self::Patch {
            offset,
            reason: reason.into(),
        }
    }
}
