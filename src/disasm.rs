use std::fmt;

use crate::err::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Target => write!(f, "target"),
        }
    }
}

/// Turns raw bytes into instruction text, one line per instruction.
pub trait Disassembler {
    fn disassemble(&mut self, bytes: &[u8]) -> Result<Vec<String>>;
}

/// Opens a disassembler for one side of the comparison. Called at most once
/// per side, on the first operation that needs it.
pub trait DisasmBackend {
    fn open(&mut self, side: Side) -> Result<Box<dyn Disassembler>>;
}

/// The backend used when no disassembler is linked in.
#[derive(Debug, Default)]
pub struct Unavailable;

impl DisasmBackend for Unavailable {
    fn open(&mut self, side: Side) -> Result<Box<dyn Disassembler>> {
        Err(Error::Backend(format!(
            "no disassembler is built in for the {} buffer",
            side
        )))
    }
}
