use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::{DecodeStats, Decoded, FrameDecoder};
use crate::error::{FrameError, Result};
use crate::frame::Frame;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Reads validated frames from any `Read` stream.
///
/// Handles partial reads internally: callers always get complete frames.
/// Never reads past the end of the frame it returns, so the transport can be
/// handed to something else between calls.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    decoder: FrameDecoder,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            decoder: FrameDecoder::new(),
        }
    }

    /// Read the next valid frame (blocking).
    ///
    /// Noise and candidates with a bad checksum or malformed frame data are
    /// skipped. Returns `Err(FrameError::ConnectionClosed)` at EOF. Other I/O
    /// errors (read timeouts included) keep the bytes collected so far, so
    /// calling again resumes the same frame.
    pub fn read_frame(&mut self) -> Result<Frame> {
        read_frame_from(&mut self.inner, &mut self.buf, &mut self.decoder)
    }

    /// Discard counters accumulated by this reader.
    pub fn stats(&self) -> DecodeStats {
        self.decoder.stats()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

pub(crate) fn read_frame_from<R: Read>(
    inner: &mut R,
    buf: &mut BytesMut,
    decoder: &mut FrameDecoder,
) -> Result<Frame> {
    loop {
        let needed = match decoder.decode(buf) {
            Decoded::Frame(frame) => return Ok(frame),
            Decoded::Incomplete { needed } => needed,
        };

        let start = buf.len();
        buf.resize(start + needed, 0);
        let read = inner.read(&mut buf[start..]);
        match read {
            Ok(0) => {
                buf.truncate(start);
                return Err(FrameError::ConnectionClosed);
            }
            Ok(n) => buf.truncate(start + n),
            Err(err) if err.kind() == ErrorKind::Interrupted => buf.truncate(start),
            Err(err) => {
                buf.truncate(start);
                return Err(FrameError::Io(err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::encode_frame;
    use crate::frame::{GenericFrame, RxIndicate, TxRequest, TxStatus, BROADCAST_ADDRESS};
    use crate::wire::{DELIMITER, MAX_FRAME_DATA};

    fn wire(frames: &[Frame]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for frame in frames {
            encode_frame(frame, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let frame: Frame = TxRequest::broadcast(1, "hello").into();
        let mut reader = FrameReader::new(Cursor::new(wire(&[frame.clone()])));
        assert_eq!(reader.read_frame().unwrap(), frame);
    }

    #[test]
    fn read_multiple_frames() {
        let frames: Vec<Frame> = vec![
            TxRequest::broadcast(1, "one").into(),
            TxStatus { id: 1, status: 0 }.into(),
            RxIndicate {
                source: BROADCAST_ADDRESS,
                rssi: 0x30,
                options: 0,
                payload: "three".into(),
            }
            .into(),
        ];

        let mut reader = FrameReader::new(Cursor::new(wire(&frames)));
        for expected in &frames {
            assert_eq!(&reader.read_frame().unwrap(), expected);
        }
        assert!(matches!(
            reader.read_frame().unwrap_err(),
            FrameError::ConnectionClosed
        ));
    }

    #[test]
    fn garbage_then_frame_consumes_exactly() {
        let frame: Frame = TxRequest::broadcast(2, "sync").into();
        let mut bytes = vec![0x00, 0x13, 0xFF, 0x7D, 0x11];
        let garbage_len = bytes.len();
        let frame_bytes = wire(&[frame.clone()]);
        bytes.extend_from_slice(&frame_bytes);
        bytes.extend_from_slice(&[0xAA, 0xBB]);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert_eq!(reader.read_frame().unwrap(), frame);
        assert_eq!(
            reader.get_ref().position() as usize,
            garbage_len + frame_bytes.len()
        );
        assert_eq!(reader.stats().skipped_bytes, garbage_len as u64);
    }

    #[test]
    fn corrupted_checksum_skipped() {
        let bad: Frame = TxRequest::broadcast(1, "bad").into();
        let good: Frame = TxRequest::broadcast(2, "good").into();
        let mut bytes = wire(&[bad]);
        let last = bytes.len() - 1;
        bytes[last] = bytes[last].wrapping_add(1);
        bytes.extend_from_slice(&wire(&[good.clone()]));

        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert_eq!(reader.read_frame().unwrap(), good);
        assert_eq!(reader.stats().checksum_mismatches, 1);
    }

    #[test]
    fn malformed_frame_skipped() {
        let mut bytes = Vec::new();
        let truncated = [0x80u8, 0x00, 0x13];
        bytes.push(DELIMITER);
        bytes.extend_from_slice(&(truncated.len() as u16).to_be_bytes());
        bytes.extend_from_slice(&truncated);
        bytes.push(crate::wire::checksum(&truncated));
        let good: Frame = TxStatus { id: 9, status: 0 }.into();
        bytes.extend_from_slice(&wire(&[good.clone()]));

        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert_eq!(reader.read_frame().unwrap(), good);
        assert_eq!(reader.stats().malformed, 1);
    }

    #[test]
    fn read_frame_with_max_length() {
        let frame = Frame::Generic(GenericFrame {
            frame_type: 0x10,
            raw: vec![0xABu8; MAX_FRAME_DATA - 1].into(),
        });
        let mut reader = FrameReader::new(Cursor::new(wire(&[frame.clone()])));
        assert_eq!(reader.read_frame().unwrap(), frame);
    }

    #[test]
    fn partial_read_handling() {
        let frame: Frame = TxRequest::broadcast(4, "slow").into();
        let byte_reader = ByteByByteReader {
            bytes: wire(&[frame.clone()]),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);
        assert_eq!(reader.read_frame().unwrap(), frame);
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut partial = BytesMut::new();
        partial.put_u8(DELIMITER);
        partial.put_u16(16);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn timeout_mid_frame_resumes() {
        let frame: Frame = TxRequest::broadcast(5, "resume").into();
        let bytes = wire(&[frame.clone()]);
        let reader = StallingReader {
            bytes,
            pos: 0,
            stall_at: 6,
            stalled: false,
        };

        let mut framed = FrameReader::new(reader);
        let err = framed.read_frame().unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(framed.read_frame().unwrap(), frame);
    }

    /// Yields one `TimedOut` once `stall_at` bytes have been delivered.
    struct StallingReader {
        bytes: Vec<u8>,
        pos: usize,
        stall_at: usize,
        stalled: bool,
    }

    impl Read for StallingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos == self.stall_at && !self.stalled {
                self.stalled = true;
                return Err(std::io::Error::from(ErrorKind::TimedOut));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let limit = if self.stalled {
                self.bytes.len()
            } else {
                self.stall_at
            };
            let n = (limit - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn interrupted_read_retries() {
        let frame: Frame = TxStatus { id: 8, status: 0 }.into();
        let reader = InterruptedThenData {
            state: 0,
            bytes: wire(&[frame.clone()]),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        assert_eq!(framed.read_frame().unwrap(), frame);
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn other_io_errors_propagate() {
        let mut framed = FrameReader::new(FailingReader);
        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }

    #[test]
    #[cfg(unix)]
    fn concurrent_reader_writer_threads() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let reader = Arc::new(Mutex::new(FrameReader::new(right)));

        let reader_thread = {
            let reader = Arc::clone(&reader);
            std::thread::spawn(move || {
                for expected in 0..64u8 {
                    let frame = reader.lock().unwrap().read_frame().unwrap();
                    let Frame::TxRequest(tx) = frame else {
                        panic!("expected TX64 request");
                    };
                    assert_eq!(tx.id, expected);
                    assert_eq!(tx.payload.as_ref(), format!("msg-{expected}").as_bytes());
                }
            })
        };

        for i in 0..64u8 {
            let frame: Frame = TxRequest::broadcast(i, format!("msg-{i}")).into();
            writer.write_frame_all(&frame).unwrap();
        }

        reader_thread.join().unwrap();
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }
}
