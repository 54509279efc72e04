//! Typed XBee API frames.
//!
//! A frame here is only the *frame data*: the type tag followed by the
//! type-specific fields. Delimiter, length and checksum belong to the
//! envelope (see [`crate::codec`]).
//!
//! Layouts (64-bit addressing only):
//! ```text
//! TX64 request  0x00 | id | destination (8) | options | payload...
//! TX status     0x89 | id | status
//! RX64 indicate 0x80 | source (8) | rssi | options | payload...
//! anything else tag  | raw...
//! ```

use std::fmt;
use std::str::FromStr;

use bytes::{Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::wire::{pack_into, Part};

/// TX request, 64-bit destination address.
pub const TX64_REQUEST: u8 = 0x00;

/// TX status report.
pub const TX_STATUS: u8 = 0x89;

/// RX indicator, 64-bit source address.
pub const RX64_INDICATOR: u8 = 0x80;

/// Broadcast destination for [`TxRequest`].
pub const BROADCAST_ADDRESS: Address = Address([0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF]);

const TX64_HEADER_LEN: usize = 11;
const TX_STATUS_LEN: usize = 3;
const RX64_HEADER_LEN: usize = 11;

/// A 64-bit radio address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address(pub [u8; 8]);

impl Address {
    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    pub fn as_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    pub fn is_broadcast(&self) -> bool {
        *self == BROADCAST_ADDRESS
    }

    fn from_frame_data(fd: &[u8], offset: usize) -> Self {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&fd[offset..offset + 8]);
        Self(bytes)
    }
}

impl From<[u8; 8]> for Address {
    fn from(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Self(value.to_be_bytes())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", HexBytes(&self.0))
    }
}

/// Error returned when parsing an [`Address`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid 64-bit address {input:?} (expected 16 hex digits)")]
pub struct ParseAddressError {
    input: String,
}

impl FromStr for Address {
    type Err = ParseAddressError;

    /// Accepts 16 hex digits, optionally prefixed with `0x` and grouped with `:`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let err = || ParseAddressError {
            input: s.to_string(),
        };
        let digits: String = s
            .trim()
            .trim_start_matches("0x")
            .chars()
            .filter(|c| *c != ':')
            .collect();
        if digits.len() != 16 {
            return Err(err());
        }
        let value = u64::from_str_radix(&digits, 16).map_err(|_| err())?;
        Ok(Address::from(value))
    }
}

/// Uppercase hex rendering of a byte slice without separators.
pub struct HexBytes<'a>(pub &'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

/// A frame type this crate does not model; kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericFrame {
    pub frame_type: u8,
    pub raw: Bytes,
}

/// Transmit request to a 64-bit destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    /// Frame id echoed by the matching [`TxStatus`]; 0 disables the report.
    pub id: u8,
    pub destination: Address,
    pub options: u8,
    pub payload: Bytes,
}

impl TxRequest {
    pub fn new(id: u8, destination: Address, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            destination,
            options: 0,
            payload: payload.into(),
        }
    }

    pub fn broadcast(id: u8, payload: impl Into<Bytes>) -> Self {
        Self::new(id, BROADCAST_ADDRESS, payload)
    }

    pub fn with_options(mut self, options: u8) -> Self {
        self.options = options;
        self
    }
}

/// Transmit status reported by the radio for a [`TxRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxStatus {
    pub id: u8,
    pub status: u8,
}

impl TxStatus {
    pub fn is_success(&self) -> bool {
        self.status == 0x00
    }
}

/// Data received from a 64-bit source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxIndicate {
    pub source: Address,
    pub rssi: u8,
    pub options: u8,
    pub payload: Bytes,
}

/// One XBee API frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Generic(GenericFrame),
    TxRequest(TxRequest),
    TxStatus(TxStatus),
    RxIndicate(RxIndicate),
}

impl Frame {
    /// Build a typed frame from frame data by dispatching on the type tag.
    ///
    /// Unknown tags become [`Frame::Generic`]. Frame data too short for the
    /// fixed fields of a known tag is rejected.
    pub fn decode(frame_data: impl Into<Bytes>) -> Result<Self> {
        let fd: Bytes = frame_data.into();
        let Some(&frame_type) = fd.first() else {
            return Err(FrameError::EmptyFrameData);
        };

        let frame = match frame_type {
            TX64_REQUEST => {
                require(&fd, TX64_HEADER_LEN)?;
                Frame::TxRequest(TxRequest {
                    id: fd[1],
                    destination: Address::from_frame_data(&fd, 2),
                    options: fd[10],
                    payload: fd.slice(TX64_HEADER_LEN..),
                })
            }
            TX_STATUS => {
                require(&fd, TX_STATUS_LEN)?;
                Frame::TxStatus(TxStatus {
                    id: fd[1],
                    status: fd[2],
                })
            }
            RX64_INDICATOR => {
                require(&fd, RX64_HEADER_LEN)?;
                Frame::RxIndicate(RxIndicate {
                    source: Address::from_frame_data(&fd, 1),
                    rssi: fd[9],
                    options: fd[10],
                    payload: fd.slice(RX64_HEADER_LEN..),
                })
            }
            _ => Frame::Generic(GenericFrame {
                frame_type,
                raw: fd.slice(1..),
            }),
        };
        Ok(frame)
    }

    /// The type tag this frame encodes with.
    pub fn frame_type(&self) -> u8 {
        match self {
            Frame::Generic(g) => g.frame_type,
            Frame::TxRequest(_) => TX64_REQUEST,
            Frame::TxStatus(_) => TX_STATUS,
            Frame::RxIndicate(_) => RX64_INDICATOR,
        }
    }

    /// Length of the encoded frame data.
    pub fn encoded_len(&self) -> usize {
        match self {
            Frame::Generic(g) => 1 + g.raw.len(),
            Frame::TxRequest(tx) => TX64_HEADER_LEN + tx.payload.len(),
            Frame::TxStatus(_) => TX_STATUS_LEN,
            Frame::RxIndicate(rx) => RX64_HEADER_LEN + rx.payload.len(),
        }
    }

    /// Encode the frame data (type tag first).
    pub fn encode(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut dst);
        dst.freeze()
    }

    /// Append the frame data to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        let tag = Part::Byte(self.frame_type());
        match self {
            Frame::Generic(g) => pack_into(&[tag, (&g.raw).into()], dst),
            Frame::TxRequest(tx) => pack_into(
                &[
                    tag,
                    tx.id.into(),
                    tx.destination.as_bytes().into(),
                    tx.options.into(),
                    (&tx.payload).into(),
                ],
                dst,
            ),
            Frame::TxStatus(status) => {
                pack_into(&[tag, status.id.into(), status.status.into()], dst)
            }
            Frame::RxIndicate(rx) => pack_into(
                &[
                    tag,
                    rx.source.as_bytes().into(),
                    rx.rssi.into(),
                    rx.options.into(),
                    (&rx.payload).into(),
                ],
                dst,
            ),
        }
    }
}

fn require(fd: &[u8], needed: usize) -> Result<()> {
    if fd.len() < needed {
        return Err(FrameError::Truncated {
            frame_type: fd[0],
            needed,
            actual: fd.len(),
        });
    }
    Ok(())
}

impl From<GenericFrame> for Frame {
    fn from(frame: GenericFrame) -> Self {
        Frame::Generic(frame)
    }
}

impl From<TxRequest> for Frame {
    fn from(frame: TxRequest) -> Self {
        Frame::TxRequest(frame)
    }
}

impl From<TxStatus> for Frame {
    fn from(frame: TxStatus) -> Self {
        Frame::TxStatus(frame)
    }
}

impl From<RxIndicate> for Frame {
    fn from(frame: RxIndicate) -> Self {
        Frame::RxIndicate(frame)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Generic(g) => write!(
                f,
                "GenericFrame[Type: {:02X}, RawData: {}]",
                g.frame_type,
                HexBytes(&g.raw)
            ),
            Frame::TxRequest(tx) => write!(
                f,
                "TX64[ID: {:02X}, Destination: {}, Options: {:02X}, Data: {}]",
                tx.id,
                tx.destination,
                tx.options,
                String::from_utf8_lossy(&tx.payload)
            ),
            Frame::TxStatus(status) => write!(
                f,
                "TX-Status[ID: {:02X}, Status: {:02X}]",
                status.id, status.status
            ),
            Frame::RxIndicate(rx) => write!(
                f,
                "RX[Source: {}, RSSI: {:02X}, Options: {:02X}, Data: {}]",
                rx.source,
                rx.rssi,
                rx.options,
                String::from_utf8_lossy(&rx.payload)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rx_sample() -> RxIndicate {
        RxIndicate {
            source: Address::from(0x0013_A200_4052_1234u64),
            rssi: 0x28,
            options: 0x02,
            payload: Bytes::from_static(b"temp=21"),
        }
    }

    #[test]
    fn decode_empty_is_malformed() {
        let err = Frame::decode(Bytes::new()).unwrap_err();
        assert!(matches!(err, FrameError::EmptyFrameData));
        assert!(err.is_malformed());
    }

    #[test]
    fn decode_unknown_tag_is_generic() {
        let frame = Frame::decode(vec![0xFFu8]).unwrap();
        assert_eq!(
            frame,
            Frame::Generic(GenericFrame {
                frame_type: 0xFF,
                raw: Bytes::new(),
            })
        );
    }

    #[test]
    fn decode_tx_request_fields() {
        let fd: Vec<u8> = vec![
            0x00, 0x07, 0x00, 0x13, 0xA2, 0x00, 0x40, 0x52, 0x12, 0x34, 0x01, b'o', b'k',
        ];
        let Frame::TxRequest(tx) = Frame::decode(fd).unwrap() else {
            panic!("expected TX64 request");
        };
        assert_eq!(tx.id, 0x07);
        assert_eq!(tx.destination, Address::from(0x0013_A200_4052_1234u64));
        assert_eq!(tx.options, 0x01);
        assert_eq!(tx.payload.as_ref(), b"ok");
    }

    #[test]
    fn decode_tx_status_fields() {
        let frame = Frame::decode(vec![0x89u8, 0x07, 0x01]).unwrap();
        assert_eq!(frame, Frame::TxStatus(TxStatus { id: 7, status: 1 }));
    }

    #[test]
    fn decode_tx_status_ignores_trailing_bytes() {
        let frame = Frame::decode(vec![0x89u8, 0x07, 0x00, 0xAA]).unwrap();
        let Frame::TxStatus(status) = frame else {
            panic!("expected TX status");
        };
        assert!(status.is_success());
    }

    #[test]
    fn decode_rx_indicate_fields() {
        let mut fd = vec![0x80];
        fd.extend_from_slice(&[0x00, 0x13, 0xA2, 0x00, 0x40, 0x52, 0x12, 0x34]);
        fd.extend_from_slice(&[0x28, 0x02]);
        fd.extend_from_slice(b"temp=21");
        assert_eq!(Frame::decode(fd).unwrap(), Frame::RxIndicate(rx_sample()));
    }

    #[test]
    fn decode_header_only_frames_have_empty_payload() {
        let tx = Frame::decode(Frame::from(TxRequest::broadcast(1, Bytes::new())).encode());
        assert!(matches!(tx, Ok(Frame::TxRequest(ref t)) if t.payload.is_empty()));

        let mut rx = vec![0x80];
        rx.extend_from_slice(&[0u8; 10]);
        assert!(matches!(Frame::decode(rx), Ok(Frame::RxIndicate(ref r)) if r.payload.is_empty()));
    }

    #[test]
    fn decode_truncated_known_types() {
        let cases: [(Vec<u8>, u8, usize); 3] = [
            (vec![0x00, 0x01, 0x00, 0x00], TX64_REQUEST, 11),
            (vec![0x89, 0x01], TX_STATUS, 3),
            (vec![0x80, 0x00, 0x13], RX64_INDICATOR, 11),
        ];
        for (fd, tag, need) in cases {
            let actual = fd.len();
            match Frame::decode(fd) {
                Err(FrameError::Truncated {
                    frame_type,
                    needed,
                    actual: got,
                }) => {
                    assert_eq!(frame_type, tag);
                    assert_eq!(needed, need);
                    assert_eq!(got, actual);
                }
                other => panic!("expected truncated error, got {other:?}"),
            }
        }
    }

    #[test]
    fn every_variant_round_trips() {
        let frames: Vec<Frame> = vec![
            TxRequest::broadcast(0x01, "hi").with_options(0x04).into(),
            TxStatus { id: 0x01, status: 0x02 }.into(),
            rx_sample().into(),
            GenericFrame {
                frame_type: 0x08,
                raw: Bytes::from_static(&[0x01, b'N', b'I']),
            }
            .into(),
        ];
        for frame in frames {
            let encoded = frame.encode();
            assert_eq!(encoded[0], frame.frame_type());
            assert_eq!(encoded.len(), frame.encoded_len());
            assert_eq!(Frame::decode(encoded).unwrap(), frame);
        }
    }

    #[test]
    fn generic_with_known_tag_encodes_verbatim() {
        let frame = Frame::Generic(GenericFrame {
            frame_type: TX_STATUS,
            raw: Bytes::from_static(&[0x05, 0x00]),
        });
        let encoded = frame.encode();
        assert_eq!(encoded.as_ref(), &[0x89, 0x05, 0x00]);
        assert_eq!(
            Frame::decode(encoded).unwrap(),
            Frame::TxStatus(TxStatus { id: 5, status: 0 })
        );
    }

    #[test]
    fn generic_with_known_tag_and_short_data_is_truncated() {
        let frame = Frame::Generic(GenericFrame {
            frame_type: TX64_REQUEST,
            raw: Bytes::from_static(&[0x01, 0x02]),
        });
        let err = Frame::decode(frame.encode()).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                frame_type: TX64_REQUEST,
                needed: 11,
                actual: 3
            }
        ));
    }

    #[test]
    fn variant_field_layout() {
        let tx: Frame = TxRequest::new(0x01, Address::from(0x0013_A200_4052_1234u64), "hi")
            .with_options(0x04)
            .into();
        assert_eq!(
            &tx.encode()[..],
            &[0x00u8, 0x01, 0x00, 0x13, 0xA2, 0x00, 0x40, 0x52, 0x12, 0x34, 0x04, b'h', b'i']
        );

        let rx: Frame = rx_sample().into();
        assert_eq!(
            &rx.encode()[..],
            &[0x80u8, 0x00, 0x13, 0xA2, 0x00, 0x40, 0x52, 0x12, 0x34, 0x28, 0x02, b't', b'e', b'm', b'p', b'=', b'2', b'1']
        );

        let mut dst = BytesMut::from(&[0xAAu8][..]);
        Frame::from(TxStatus { id: 7, status: 0 }).encode_into(&mut dst);
        assert_eq!(&dst[..], &[0xAAu8, 0x89, 0x07, 0x00]);
    }

    #[test]
    fn broadcast_address_layout() {
        assert_eq!(
            BROADCAST_ADDRESS.as_bytes(),
            &[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF]
        );
        assert!(BROADCAST_ADDRESS.is_broadcast());
        assert_eq!(BROADCAST_ADDRESS.as_u64(), 0xFFFF);
    }

    #[test]
    fn address_parses_hex() {
        assert_eq!(
            "0013A20040521234".parse::<Address>().unwrap(),
            Address::from(0x0013_A200_4052_1234u64)
        );
        assert_eq!(
            "0x00:00:00:00:00:00:ff:ff".parse::<Address>().unwrap(),
            BROADCAST_ADDRESS
        );
        assert!("1234".parse::<Address>().is_err());
        assert!("zz13A20040521234".parse::<Address>().is_err());
    }

    #[test]
    fn display_matches_radio_console_style() {
        let tx: Frame = TxRequest::broadcast(0x01, "hi").into();
        assert_eq!(
            tx.to_string(),
            "TX64[ID: 01, Destination: 000000000000FFFF, Options: 00, Data: hi]"
        );

        let status: Frame = TxStatus { id: 0x01, status: 0x00 }.into();
        assert_eq!(status.to_string(), "TX-Status[ID: 01, Status: 00]");

        let rx: Frame = rx_sample().into();
        assert_eq!(
            rx.to_string(),
            "RX[Source: 0013A20040521234, RSSI: 28, Options: 02, Data: temp=21]"
        );

        let generic = Frame::decode(vec![0x8Au8, 0x02]).unwrap();
        assert_eq!(generic.to_string(), "GenericFrame[Type: 8A, RawData: 02]");
    }
}
