//! Byte-level primitives shared by the frame model and the envelope codec.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Start-of-frame delimiter.
pub const DELIMITER: u8 = 0x7E;

/// Size of the big-endian length field.
pub const LENGTH_SIZE: usize = 2;

/// Size of the trailing checksum.
pub const CHECKSUM_SIZE: usize = 1;

/// Envelope bytes around the frame data: delimiter (1) + length (2) + checksum (1).
pub const ENVELOPE_OVERHEAD: usize = 1 + LENGTH_SIZE + CHECKSUM_SIZE;

/// Largest frame data the length field can describe.
pub const MAX_FRAME_DATA: usize = u16::MAX as usize;

/// Compute the XBee checksum: `0xFF` minus the 8-bit wrapping sum of `data`.
pub fn checksum(data: &[u8]) -> u8 {
    let sum = data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    0xFF - sum
}

/// Check a received checksum against the frame data it covers.
pub fn verify_checksum(data: &[u8], received: u8) -> bool {
    checksum(data) == received
}

/// Encode a length as a 2-byte big-endian field.
///
/// Lengths above [`MAX_FRAME_DATA`] are rejected rather than truncated.
pub fn encode_u16_be(n: usize) -> Result<[u8; 2]> {
    let value = u16::try_from(n).map_err(|_| FrameError::FrameTooLarge {
        size: n,
        max: MAX_FRAME_DATA,
    })?;
    Ok(value.to_be_bytes())
}

/// Decode a 2-byte big-endian field.
pub fn decode_u16_be(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// One argument to [`pack`]: either a single byte or a run of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part<'a> {
    Byte(u8),
    Slice(&'a [u8]),
}

impl Part<'_> {
    pub fn len(&self) -> usize {
        match self {
            Part::Byte(_) => 1,
            Part::Slice(slice) => slice.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<u8> for Part<'_> {
    fn from(b: u8) -> Self {
        Part::Byte(b)
    }
}

impl<'a> From<&'a [u8]> for Part<'a> {
    fn from(slice: &'a [u8]) -> Self {
        Part::Slice(slice)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Part<'a> {
    fn from(array: &'a [u8; N]) -> Self {
        Part::Slice(array.as_slice())
    }
}

impl<'a> From<&'a Vec<u8>> for Part<'a> {
    fn from(vec: &'a Vec<u8>) -> Self {
        Part::Slice(vec.as_slice())
    }
}

impl<'a> From<&'a Bytes> for Part<'a> {
    fn from(bytes: &'a Bytes) -> Self {
        Part::Slice(bytes.as_ref())
    }
}

/// Concatenate bytes and byte runs, preserving argument order.
pub fn pack(parts: &[Part<'_>]) -> Bytes {
    let mut dst = BytesMut::with_capacity(parts.iter().map(Part::len).sum());
    pack_into(parts, &mut dst);
    dst.freeze()
}

/// Append `parts` to an existing buffer.
pub fn pack_into(parts: &[Part<'_>], dst: &mut BytesMut) {
    for part in parts {
        match part {
            Part::Byte(b) => dst.put_u8(*b),
            Part::Slice(slice) => dst.put_slice(slice),
        }
    }
}
