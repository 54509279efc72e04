use bytes::{Buf, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::frame::Frame;
use crate::wire::{checksum, decode_u16_be, encode_u16_be, pack_into, DELIMITER, ENVELOPE_OVERHEAD};

/// Delimiter (1) + length (2).
pub const HEADER_SIZE: usize = 3;

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────────┬────────────┬────────────────────┬──────────┐
/// │ Delimiter │ Length     │ Frame data         │ Checksum │
/// │ 0x7E      │ (2B BE)    │ (Length bytes)     │ (1B)     │
/// └───────────┴────────────┴────────────────────┴──────────┘
/// ```
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) -> Result<()> {
    let frame_data = frame.encode();
    let length = encode_u16_be(frame_data.len())?;
    dst.reserve(ENVELOPE_OVERHEAD + frame_data.len());
    pack_into(
        &[
            DELIMITER.into(),
            (&length).into(),
            (&frame_data).into(),
            checksum(&frame_data).into(),
        ],
        dst,
    );
    Ok(())
}

/// Counters for what the decoder accepted and threw away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Frames returned to the caller.
    pub frames: u64,
    /// Complete candidates dropped because the checksum did not match.
    pub checksum_mismatches: u64,
    /// Checksum-valid candidates dropped because the frame data was malformed.
    pub malformed: u64,
    /// Bytes skipped while searching for a delimiter.
    pub skipped_bytes: u64,
}

impl DecodeStats {
    /// Candidates dropped for any reason.
    pub fn discarded(&self) -> u64 {
        self.checksum_mismatches + self.malformed
    }
}

/// Outcome of one [`FrameDecoder::decode`] call.
#[derive(Debug)]
pub enum Decoded {
    Frame(Frame),
    /// At least `needed` more bytes are required before progress is possible.
    Incomplete { needed: usize },
}

/// Incremental, resynchronizing envelope decoder.
///
/// Bytes before a delimiter are skipped. A complete candidate that fails its
/// checksum, or whose frame data does not decode, is dropped as a whole and
/// scanning resumes after its checksum byte.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    stats: DecodeStats,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Decode the next frame from `src`, consuming every byte it inspects.
    ///
    /// `Incomplete::needed` is exact: reading that many more bytes never
    /// pulls in anything past the end of the frame being assembled.
    pub fn decode(&mut self, src: &mut BytesMut) -> Decoded {
        loop {
            match src.iter().position(|b| *b == DELIMITER) {
                Some(0) => {}
                Some(pos) => self.skip(src, pos),
                None => {
                    let len = src.len();
                    self.skip(src, len);
                    return Decoded::Incomplete { needed: 1 };
                }
            }

            if src.len() < HEADER_SIZE {
                return Decoded::Incomplete {
                    needed: HEADER_SIZE - src.len(),
                };
            }

            let length = decode_u16_be([src[1], src[2]]) as usize;
            let total = HEADER_SIZE + length + 1;
            if src.len() < total {
                return Decoded::Incomplete {
                    needed: total - src.len(),
                };
            }

            let mut candidate = src.split_to(total);
            candidate.advance(HEADER_SIZE);
            let received = candidate[length];
            candidate.truncate(length);

            match validate(candidate.freeze(), received) {
                Ok(frame) => {
                    self.stats.frames += 1;
                    tracing::trace!(frame_type = frame.frame_type(), length, "frame accepted");
                    return Decoded::Frame(frame);
                }
                Err(err @ FrameError::ChecksumMismatch { .. }) => {
                    self.stats.checksum_mismatches += 1;
                    tracing::debug!(length, error = %err, "discarding frame candidate");
                }
                Err(err) => {
                    self.stats.malformed += 1;
                    tracing::debug!(length, error = %err, "discarding frame candidate");
                }
            }
        }
    }

    fn skip(&mut self, src: &mut BytesMut, n: usize) {
        if n == 0 {
            return;
        }
        src.advance(n);
        self.stats.skipped_bytes += n as u64;
        tracing::trace!(skipped = n, "resynchronizing on delimiter");
    }
}

fn validate(frame_data: Bytes, received: u8) -> Result<Frame> {
    let expected = checksum(&frame_data);
    if expected != received {
        return Err(FrameError::ChecksumMismatch { expected, received });
    }
    Frame::decode(frame_data)
}

#[cfg(feature = "async")]
pub use self::async_codec::XBeeCodec;

#[cfg(feature = "async")]
mod async_codec {
    use bytes::BytesMut;
    use tokio_util::codec::{Decoder, Encoder};

    use super::{encode_frame, DecodeStats, Decoded, FrameDecoder};
    use crate::error::{FrameError, Result};
    use crate::frame::Frame;

    /// `tokio_util` codec for XBee API frames.
    #[derive(Debug, Default)]
    pub struct XBeeCodec {
        decoder: FrameDecoder,
    }

    impl XBeeCodec {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn stats(&self) -> DecodeStats {
            self.decoder.stats()
        }
    }

    impl Decoder for XBeeCodec {
        type Item = Frame;
        type Error = FrameError;

        fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
            match self.decoder.decode(src) {
                Decoded::Frame(frame) => Ok(Some(frame)),
                Decoded::Incomplete { needed } => {
                    src.reserve(needed);
                    Ok(None)
                }
            }
        }

        fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
            match self.decode(src)? {
                Some(frame) => Ok(Some(frame)),
                None if src.is_empty() => Ok(None),
                None => Err(FrameError::ConnectionClosed),
            }
        }
    }

    impl Encoder<Frame> for XBeeCodec {
        type Error = FrameError;

        fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
            encode_frame(&item, dst)
        }
    }

    impl Encoder<&Frame> for XBeeCodec {
        type Error = FrameError;

        fn encode(&mut self, item: &Frame, dst: &mut BytesMut) -> Result<()> {
            encode_frame(item, dst)
        }
    }
}
