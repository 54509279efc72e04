//! XBee API frame model and delimiter-synchronized stream codec.
//!
//! Every frame travels in an envelope:
//! - the start delimiter `0x7E`
//! - a 2-byte big-endian length of the frame data
//! - the frame data (type tag + fields)
//! - a 1-byte checksum over the frame data
//!
//! Readers skip noise, drop corrupted candidates and resynchronize on the
//! next delimiter. Callers only ever see validated, typed frames.

pub mod codec;
pub mod error;
pub mod frame;
pub mod reader;
pub mod stream;
pub mod wire;
pub mod writer;

#[cfg(feature = "async")]
pub use codec::XBeeCodec;
pub use codec::{encode_frame, DecodeStats, Decoded, FrameDecoder, HEADER_SIZE};
pub use error::{FrameError, Result};
pub use frame::{
    Address, Frame, GenericFrame, HexBytes, ParseAddressError, RxIndicate, TxRequest, TxStatus,
    BROADCAST_ADDRESS, RX64_INDICATOR, TX64_REQUEST, TX_STATUS,
};
pub use reader::FrameReader;
pub use stream::FrameStream;
pub use wire::{
    checksum, decode_u16_be, encode_u16_be, pack, verify_checksum, Part, DELIMITER,
    ENVELOPE_OVERHEAD, MAX_FRAME_DATA,
};
pub use writer::FrameWriter;
