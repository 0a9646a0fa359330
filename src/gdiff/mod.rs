//! GDIFF binary patches.
//!
//! A patch is the magic header, a sequence of instructions and a single zero
//! byte. Instructions either append literal bytes (DATA) or copy a range of
//! the old buffer (COPY). Every multi-byte field is big-endian.
//!
//! | opcode    | instruction                                  |
//! |-----------|----------------------------------------------|
//! | 0         | end of patch                                 |
//! | 1..=246   | DATA, the opcode is the length               |
//! | 247       | DATA, u16 length                             |
//! | 248       | DATA, i32 length                             |
//! | 249..=251 | COPY, u16 position, u8/u16/i32 length        |
//! | 252..=254 | COPY, i32 position, u8/u16/i32 length        |
//! | 255       | COPY, i64 position, i32 length               |

mod decode;
mod encode;

pub use decode::{Instruction, Instructions, apply};
pub use encode::Encoder;

pub const MAGIC: [u8; 5] = [0xd1, 0xff, 0xd1, 0xff, 0x04];

pub const END: u8 = 0;
pub const DATA_INLINE_MAX: u64 = 246;
pub const DATA_U16: u8 = 247;
pub const DATA_I32: u8 = 248;
pub const COPY_U16_POSITION: u8 = 249;
pub const COPY_I32_POSITION: u8 = 252;
pub const COPY_I64_POSITION: u8 = 255;

/// Largest length a single instruction can carry.
pub const MAX_CHUNK: u64 = i32::MAX as u64;
