pub mod distance;
pub mod stream;

pub use distance::{Distance, DistanceAlgorithm};
pub use stream::DiffOpStream;

/// One edit: `source` found at `source_offset` in the old buffer is replaced by
/// `target` at `target_offset` in the new buffer.
///
/// An empty `source` is a pure insertion, an empty `target` a pure deletion.
/// Bytes between two operations are equal in both buffers and are never
/// materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOp<'a> {
    pub source_offset: u64,
    pub source: &'a [u8],
    pub target_offset: u64,
    pub target: &'a [u8],
}

impl<'a> DiffOp<'a> {
    pub fn source_len(&self) -> u64 {
        self.source.len() as u64
    }

    pub fn target_len(&self) -> u64 {
        self.target.len() as u64
    }

    pub fn source_end(&self) -> u64 {
        self.source_offset + self.source_len()
    }

    pub fn target_end(&self) -> u64 {
        self.target_offset + self.target_len()
    }

    pub fn is_insertion(&self) -> bool {
        self.source.is_empty()
    }

    pub fn is_deletion(&self) -> bool {
        self.target.is_empty()
    }
}
