use super::{
    COPY_I32_POSITION, COPY_I64_POSITION, COPY_U16_POSITION, DATA_I32, DATA_U16, END, MAGIC,
};
use crate::err::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    Data(&'a [u8]),
    Copy { position: u64, len: u64 },
}

/// Iterates the instructions of a patch together with their opcodes, up to
/// the end marker.
#[derive(Debug)]
pub struct Instructions<'a> {
    patch: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Instructions<'a> {
    pub fn new(patch: &'a [u8]) -> Result<Self> {
        if !patch.starts_with(&MAGIC) {
            return Err(Error::patch(0, "missing GDIFF magic"));
        }
        Ok(Self {
            patch,
            pos: MAGIC.len(),
            done: false,
        })
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.patch.len())
            .ok_or_else(|| Error::patch(self.pos, format!("truncated, {} more bytes expected", n)))?;
        let bytes = &self.patch[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    fn read_u8(&mut self) -> Result<u64> {
        Ok(self.take_array::<1>()?[0] as u64)
    }

    fn read_u16(&mut self) -> Result<u64> {
        Ok(u16::from_be_bytes(self.take_array()?) as u64)
    }

    fn read_i32(&mut self) -> Result<u64> {
        let at = self.pos;
        let value = i32::from_be_bytes(self.take_array()?);
        u64::try_from(value).map_err(|_| Error::patch(at, format!("negative field {}", value)))
    }

    fn read_i64(&mut self) -> Result<u64> {
        let at = self.pos;
        let value = i64::from_be_bytes(self.take_array()?);
        u64::try_from(value).map_err(|_| Error::patch(at, format!("negative field {}", value)))
    }

    fn read_data(&mut self, len: u64) -> Result<Instruction<'a>> {
        let len = usize::try_from(len).map_err(|_| Error::patch(self.pos, "data too large"))?;
        Ok(Instruction::Data(self.take(len)?))
    }

    fn read_instruction(&mut self) -> Result<Option<(u8, Instruction<'a>)>> {
        let opcode = self.read_u8()? as u8;
        let instruction = match opcode {
            END => return Ok(None),
            1..=246 => self.read_data(opcode as u64)?,
            DATA_U16 => {
                let len = self.read_u16()?;
                self.read_data(len)?
            }
            DATA_I32 => {
                let len = self.read_i32()?;
                self.read_data(len)?
            }
            COPY_I64_POSITION => {
                let position = self.read_i64()?;
                let len = self.read_i32()?;
                Instruction::Copy { position, len }
            }
            COPY_U16_POSITION..COPY_I64_POSITION => {
                let (position, width) = if opcode < COPY_I32_POSITION {
                    (self.read_u16()?, opcode - COPY_U16_POSITION)
                } else {
                    (self.read_i32()?, opcode - COPY_I32_POSITION)
                };
                let len = match width {
                    0 => self.read_u8()?,
                    1 => self.read_u16()?,
                    _ => self.read_i32()?,
                };
                Instruction::Copy { position, len }
            }
        };
        Ok(Some((opcode, instruction)))
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<(u8, Instruction<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_instruction() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                if self.pos != self.patch.len() {
                    return Some(Err(Error::patch(self.pos, "trailing bytes after end marker")));
                }
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Applies a patch to `source` and returns the rebuilt buffer.
pub fn apply(source: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
    let mut patched = Vec::with_capacity(source.len());
    for item in Instructions::new(patch)? {
        match item?.1 {
            Instruction::Data(bytes) => patched.extend_from_slice(bytes),
            Instruction::Copy { position, len } => {
                let range = usize::try_from(position)
                    .ok()
                    .zip(usize::try_from(len).ok())
                    .and_then(|(start, len)| Some(start..start.checked_add(len)?))
                    .filter(|range| range.end <= source.len())
                    .ok_or_else(|| {
                        Error::patch(
                            patched.len(),
                            format!(
                                "copy of {} bytes at {:#x} beyond source of {} bytes",
                                len,
                                position,
                                source.len()
                            ),
                        )
                    })?;
                patched.extend_from_slice(&source[range]);
            }
        }
    }
    Ok(patched)
}
