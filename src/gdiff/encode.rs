use std::io::{self, Write};

use super::{
    COPY_I32_POSITION, COPY_I64_POSITION, COPY_U16_POSITION, DATA_I32, DATA_INLINE_MAX, DATA_U16,
    END, MAGIC, MAX_CHUNK,
};
use crate::diff::DiffOp;

/// Streams diff operations as GDIFF instructions.
///
/// `emitted_to` is the position in the old buffer up to which the patch
/// already accounts for every byte, either copied or replaced. The equal run
/// in front of each operation becomes a COPY from there.
#[derive(Debug)]
pub struct Encoder {
    emitted_to: u64,
    chunk_limit: u64,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            emitted_to: 0,
            chunk_limit: MAX_CHUNK,
        }
    }

    /// Splits long instructions at `limit` instead of `i32::MAX`, so chunking
    /// can be exercised without gigabyte buffers.
    #[cfg(test)]
    pub(crate) fn with_chunk_limit(limit: u64) -> Self {
        assert!(limit > 0 && limit <= MAX_CHUNK);
        Self {
            emitted_to: 0,
            chunk_limit: limit,
        }
    }

    pub fn emitted_to(&self) -> u64 {
        self.emitted_to
    }

    pub fn write_header<W: Write + ?Sized>(&mut self, out: &mut W) -> io::Result<()> {
        out.write_all(&MAGIC)
    }

    pub fn write_op<W: Write + ?Sized>(&mut self, op: &DiffOp<'_>, out: &mut W) -> io::Result<()> {
        debug_assert!(op.source_offset >= self.emitted_to, "operations out of order");
        let gap = op.source_offset.saturating_sub(self.emitted_to);
        if gap > 0 {
            self.write_copy(self.emitted_to, gap, out)?;
        }
        // an empty DATA would read as the end of the patch, a deletion is
        // fully expressed by the copy skipping over it
        if !op.target.is_empty() {
            self.write_data(op.target, out)?;
        }
        self.emitted_to = op.source_end();
        log::trace!(
            "gdiff op at {:#x}: copied {} bytes, {} literal bytes",
            op.source_offset,
            gap,
            op.target.len()
        );
        Ok(())
    }

    /// Copies whatever is left of the old buffer after the last operation.
    pub fn write_tail<W: Write + ?Sized>(&mut self, source_len: u64, out: &mut W) -> io::Result<()> {
        if source_len > self.emitted_to {
            self.write_copy(self.emitted_to, source_len - self.emitted_to, out)?;
            self.emitted_to = source_len;
        }
        Ok(())
    }

    pub fn write_end<W: Write + ?Sized>(&mut self, out: &mut W) -> io::Result<()> {
        out.write_all(&[END])
    }

    fn write_copy<W: Write + ?Sized>(
        &self,
        mut position: u64,
        mut len: u64,
        out: &mut W,
    ) -> io::Result<()> {
        while len > 0 {
            let chunk = len.min(self.chunk_limit);
            write_copy_chunk(position, chunk, out)?;
            position += chunk;
            len -= chunk;
        }
        Ok(())
    }

    fn write_data<W: Write + ?Sized>(&self, mut bytes: &[u8], out: &mut W) -> io::Result<()> {
        while !bytes.is_empty() {
            let chunk = (bytes.len() as u64).min(self.chunk_limit) as usize;
            write_data_len(chunk as u64, out)?;
            out.write_all(&bytes[..chunk])?;
            bytes = &bytes[chunk..];
        }
        Ok(())
    }
}

fn write_copy_chunk<W: Write + ?Sized>(position: u64, len: u64, out: &mut W) -> io::Result<()> {
    debug_assert!(len > 0 && len <= MAX_CHUNK);
    let mut buf = Vec::with_capacity(13);
    buf.push(0);

    let mut opcode = if position <= u16::MAX as u64 {
        buf.extend_from_slice(&(position as u16).to_be_bytes());
        COPY_U16_POSITION
    } else if position <= i32::MAX as u64 {
        buf.extend_from_slice(&(position as i32).to_be_bytes());
        COPY_I32_POSITION
    } else {
        buf.extend_from_slice(&(position as i64).to_be_bytes());
        COPY_I64_POSITION
    };

    if opcode == COPY_I64_POSITION {
        buf.extend_from_slice(&(len as i32).to_be_bytes());
    } else if len <= u8::MAX as u64 {
        buf.push(len as u8);
    } else if len <= u16::MAX as u64 {
        buf.extend_from_slice(&(len as u16).to_be_bytes());
        opcode += 1;
    } else {
        buf.extend_from_slice(&(len as i32).to_be_bytes());
        opcode += 2;
    }

    buf[0] = opcode;
    out.write_all(&buf)
}

fn write_data_len<W: Write + ?Sized>(len: u64, out: &mut W) -> io::Result<()> {
    debug_assert!(len > 0 && len <= MAX_CHUNK);
    if len <= DATA_INLINE_MAX {
        out.write_all(&[len as u8])
    } else if len <= u16::MAX as u64 {
        out.write_all(&[DATA_U16])?;
        out.write_all(&(len as u16).to_be_bytes())
    } else {
        out.write_all(&[DATA_I32])?;
        out.write_all(&(len as i32).to_be_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op<'a>(source_offset: u64, source: &'a [u8], target_offset: u64, target: &'a [u8]) -> DiffOp<'a> {
        DiffOp {
            source_offset,
            source,
            target_offset,
            target,
        }
    }

    fn copy_bytes(position: u64, len: u64) -> Vec<u8> {
        let mut out = Vec::new();
        write_copy_chunk(position, len, &mut out).unwrap();
        out
    }

    fn data_header(len: u64) -> Vec<u8> {
        let mut out = Vec::new();
        write_data_len(len, &mut out).unwrap();
        out
    }

    #[test]
    fn test_single_substitution_stream() {
        let mut encoder = Encoder::new();
        let mut out = Vec::new();
        encoder.write_header(&mut out).unwrap();
        encoder.write_op(&op(3, b"D", 3, b"X"), &mut out).unwrap();
        encoder.write_end(&mut out).unwrap();
        assert_eq!(
            out,
            vec![0xd1, 0xff, 0xd1, 0xff, 0x04, 249, 0x00, 0x00, 3, 1, b'X', 0]
        );
        assert_eq!(encoder.emitted_to(), 4);
    }

    #[test]
    fn test_insertion_into_empty_uses_u16_data() {
        let target = vec![0xaa; 300];
        let mut encoder = Encoder::new();
        let mut out = Vec::new();
        encoder.write_op(&op(0, &[], 0, &target), &mut out).unwrap();
        assert_eq!(&out[..3], &[DATA_U16, 0x01, 0x2c]);
        assert_eq!(&out[3..], &target[..]);
    }

    #[test]
    fn test_copy_length_widths() {
        assert_eq!(copy_bytes(0, 1), vec![249, 0, 0, 1]);
        assert_eq!(copy_bytes(0, 255), vec![249, 0, 0, 255]);
        assert_eq!(copy_bytes(0, 256), vec![250, 0, 0, 0x01, 0x00]);
        assert_eq!(copy_bytes(0, 65535), vec![250, 0, 0, 0xff, 0xff]);
        assert_eq!(copy_bytes(0, 65536), vec![251, 0, 0, 0, 1, 0, 0]);
        assert_eq!(
            copy_bytes(0, i32::MAX as u64),
            vec![251, 0, 0, 0x7f, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn test_copy_position_widths() {
        assert_eq!(copy_bytes(65535, 1), vec![249, 0xff, 0xff, 1]);
        assert_eq!(copy_bytes(65536, 1), vec![252, 0, 1, 0, 0, 1]);
        assert_eq!(copy_bytes(65536, 256), vec![253, 0, 1, 0, 0, 1, 0]);
        assert_eq!(
            copy_bytes(i32::MAX as u64, 65536),
            vec![254, 0x7f, 0xff, 0xff, 0xff, 0, 1, 0, 0]
        );
        // a 64-bit position always pairs with a 4-byte length
        assert_eq!(
            copy_bytes(i32::MAX as u64 + 1, 1),
            vec![255, 0, 0, 0, 0, 0x80, 0, 0, 0, 0, 0, 0, 1]
        );
    }

    #[test]
    fn test_data_length_widths() {
        assert_eq!(data_header(1), vec![1]);
        assert_eq!(data_header(246), vec![246]);
        assert_eq!(data_header(247), vec![DATA_U16, 0, 247]);
        assert_eq!(data_header(255), vec![DATA_U16, 0, 255]);
        assert_eq!(data_header(256), vec![DATA_U16, 1, 0]);
        assert_eq!(data_header(65535), vec![DATA_U16, 0xff, 0xff]);
        assert_eq!(data_header(65536), vec![DATA_I32, 0, 1, 0, 0]);
        assert_eq!(
            data_header(i32::MAX as u64),
            vec![DATA_I32, 0x7f, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn test_gap_beyond_i32_is_split_with_advancing_positions() {
        let gap = i32::MAX as u64 + 1;
        let mut encoder = Encoder::new();
        let mut out = Vec::new();
        encoder.write_op(&op(gap, b"a", gap, b"b"), &mut out).unwrap();
        let mut expected = vec![251, 0, 0, 0x7f, 0xff, 0xff, 0xff];
        expected.extend_from_slice(&[252, 0x7f, 0xff, 0xff, 0xff, 1]);
        expected.extend_from_slice(&[1, b'b']);
        assert_eq!(out, expected);
        assert_eq!(encoder.emitted_to(), gap + 1);
    }

    #[test]
    fn test_data_is_split_at_chunk_limit() {
        let target: Vec<u8> = (0..700u32).map(|i| i as u8).collect();
        let mut encoder = Encoder::with_chunk_limit(300);
        let mut out = Vec::new();
        encoder.write_op(&op(0, &[], 0, &target), &mut out).unwrap();

        let mut expected = Vec::new();
        for chunk in target.chunks(300) {
            expected.extend(data_header(chunk.len() as u64));
            expected.extend_from_slice(chunk);
        }
        assert_eq!(out, expected);
        // the remainder carries its own length class
        assert_eq!(out[2 * 303], 100);
    }

    #[test]
    fn test_deletion_emits_no_data() {
        let mut encoder = Encoder::new();
        let mut out = Vec::new();
        encoder.write_op(&op(2, b"xyz", 2, &[]), &mut out).unwrap();
        assert_eq!(out, vec![249, 0, 0, 2]);
        assert_eq!(encoder.emitted_to(), 5);
    }

    #[test]
    fn test_tail_copies_rest_of_source() {
        let mut encoder = Encoder::new();
        let mut out = Vec::new();
        encoder.write_op(&op(3, b"D", 3, b"X"), &mut out).unwrap();
        out.clear();
        encoder.write_tail(8, &mut out).unwrap();
        assert_eq!(out, vec![249, 0, 4, 4]);
        out.clear();
        encoder.write_tail(8, &mut out).unwrap();
        assert!(out.is_empty());
    }
}
