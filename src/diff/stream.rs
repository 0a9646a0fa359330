use similar::{Algorithm, DiffOp as Hunk, capture_diff_slices};

use super::DiffOp;

/// The ordered edit operations turning one buffer into another.
///
/// Adjacent non-equal hunks reported by the engine are merged, so two
/// operations are always separated by at least one equal byte.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffOpStream<'a> {
    ops: Vec<DiffOp<'a>>,
}

#[derive(Debug, Default)]
struct Pending {
    old_idx: usize,
    old_len: usize,
    new_idx: usize,
    new_len: usize,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.old_len == 0 && self.new_len == 0
    }
}

impl<'a> DiffOpStream<'a> {
    pub fn from_compare(old: &'a [u8], new: &'a [u8]) -> Self {
        let hunks = capture_diff_slices(Algorithm::Myers, old, new);
        let mut ops = Vec::new();
        let mut pending = Pending::default();
        let mut old_ptr = 0;
        let mut new_ptr = 0;

        let flush = move |pending: &mut Pending, ops: &mut Vec<DiffOp<'a>>| {
            if !pending.is_empty() {
                ops.push(DiffOp {
                    source_offset: pending.old_idx as u64,
                    source: &old[pending.old_idx..pending.old_idx + pending.old_len],
                    target_offset: pending.new_idx as u64,
                    target: &new[pending.new_idx..pending.new_idx + pending.new_len],
                });
            }
            *pending = Pending::default();
        };

        for hunk in &hunks {
            let (old_len, new_len) = match hunk {
                Hunk::Equal { len, .. } => {
                    flush(&mut pending, &mut ops);
                    old_ptr += len;
                    new_ptr += len;
                    continue;
                }
                Hunk::Insert { new_len, .. } => (0, *new_len),
                Hunk::Delete { old_len, .. } => (*old_len, 0),
                Hunk::Replace {
                    old_len, new_len, ..
                } => (*old_len, *new_len),
            };
            if pending.is_empty() {
                pending.old_idx = old_ptr;
                pending.new_idx = new_ptr;
            }
            pending.old_len += old_len;
            pending.new_len += new_len;
            old_ptr += old_len;
            new_ptr += new_len;
        }
        flush(&mut pending, &mut ops);

        log::debug!(
            "compared {} and {} bytes: {} operations",
            old.len(),
            new.len(),
            ops.len()
        );
        Self { ops }
    }

    /// Wraps operations produced elsewhere. They must already be ordered and
    /// non-overlapping.
    pub fn from_ops(ops: Vec<DiffOp<'a>>) -> Self {
        debug_assert!(
            ops.windows(2).all(|w| w[0].source_end() <= w[1].source_offset
                && w[0].target_end() <= w[1].target_offset),
            "operations must be ordered and non-overlapping"
        );
        Self { ops }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffOp<'a>> {
        self.ops.iter()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Rebuilds the new buffer from the old one.
    pub fn patch(&self, old: &[u8]) -> Vec<u8> {
        let inserted: usize = self.ops.iter().map(|op| op.target.len()).sum();
        let mut patched = Vec::with_capacity(old.len() + inserted);

        let mut old_ptr = 0;
        for op in &self.ops {
            let start = op.source_offset as usize;
            patched.extend_from_slice(&old[old_ptr..start]);
            patched.extend_from_slice(op.target);
            old_ptr = start + op.source.len();
        }
        patched.extend_from_slice(&old[old_ptr..]);

        patched
    }
}

impl<'s, 'a> IntoIterator for &'s DiffOpStream<'a> {
    type Item = &'s DiffOp<'a>;
    type IntoIter = std::slice::Iter<'s, DiffOp<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
