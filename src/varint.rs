//! Variable-length integers (QUIC layout).
//!
//! The two most significant bits of the first byte give the encoded width,
//! the rest of the bytes hold the value in network byte order:
//!
//! | 2MSB | Length  | Usable Bits | Range                  |
//! |------|---------|-------------|------------------------|
//! | 00   | 1 byte  | 6           | 0–63                   |
//! | 01   | 2 bytes | 14          | 0–16383                |
//! | 10   | 4 bytes | 30          | 0–1073741823           |
//! | 11   | 8 bytes | 62          | 0–4611686018427387903  |

use crate::error::{FrameError, Result};

/// Largest value a varint can carry (2^62 - 1).
pub const MAX_VARINT: u64 = (1 << 62) - 1;

/// Widest possible encoding in bytes.
pub const MAX_VARINT_LEN: usize = 8;

/// Number of bytes `value` encodes to, without writing anything.
///
/// Use this to size a buffer before allocating it.
pub fn varint_len(value: u64) -> Result<usize> {
    if value < 1 << 6 {
        Ok(1)
    } else if value < 1 << 14 {
        Ok(2)
    } else if value < 1 << 30 {
        Ok(4)
    } else if value < 1 << 62 {
        Ok(8)
    } else {
        Err(FrameError::EncodingOverflow { value })
    }
}

/// Encode `value` into the front of `buf`.
///
/// Returns the number of bytes written. Nothing is written on error.
pub fn encode_varint(value: u64, buf: &mut [u8]) -> Result<usize> {
    let len = varint_len(value)?;
    if buf.len() < len {
        return Err(FrameError::BufferTooSmall { needed: len });
    }

    match len {
        1 => buf[0] = value as u8,
        2 => {
            let bytes = (value as u16 | 0x4000).to_be_bytes();
            buf[..2].copy_from_slice(&bytes);
        }
        4 => {
            let bytes = (value as u32 | 0x8000_0000).to_be_bytes();
            buf[..4].copy_from_slice(&bytes);
        }
        _ => {
            let bytes = (value | 0xc000_0000_0000_0000).to_be_bytes();
            buf[..8].copy_from_slice(&bytes);
        }
    }

    Ok(len)
}

/// Decode a varint from the front of `buf`.
///
/// Returns `(value, bytes_consumed)`.
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize)> {
    let first = *buf.first().ok_or(FrameError::BufferTooSmall { needed: 1 })?;
    let len = 1usize << (first >> 6);
    if buf.len() < len {
        return Err(FrameError::BufferTooSmall { needed: len });
    }

    let mut value = u64::from(first & 0x3f);
    for &byte in &buf[1..len] {
        value = (value << 8) | u64::from(byte);
    }
    Ok((value, len))
}
