use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::encode_frame;
use crate::error::{FrameError, Result};
use crate::frame::Frame;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Writes complete envelopes to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Encode `frame` and hand the whole envelope to a single `write` call.
    ///
    /// Returns the transport's byte count as-is: a short write is not
    /// retried. Use [`FrameWriter::write_frame_all`] to keep writing.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<usize> {
        write_frame_to(&mut self.inner, &mut self.buf, frame)
    }

    /// Encode `frame` and write the whole envelope, looping over short writes.
    pub fn write_frame_all(&mut self, frame: &Frame) -> Result<()> {
        write_frame_all_to(&mut self.inner, &mut self.buf, frame)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        flush(&mut self.inner)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

pub(crate) fn write_frame_to<W: Write>(
    inner: &mut W,
    buf: &mut BytesMut,
    frame: &Frame,
) -> Result<usize> {
    buf.clear();
    encode_frame(frame, buf)?;

    let written = loop {
        match inner.write(&buf[..]) {
            Ok(n) => break n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    };

    if written < buf.len() {
        tracing::warn!(
            written,
            total = buf.len(),
            frame_type = frame.frame_type(),
            "short frame write"
        );
    }

    flush(inner)?;
    Ok(written)
}

pub(crate) fn write_frame_all_to<W: Write>(
    inner: &mut W,
    buf: &mut BytesMut,
    frame: &Frame,
) -> Result<()> {
    buf.clear();
    encode_frame(frame, buf)?;

    let mut offset = 0usize;
    while offset < buf.len() {
        match inner.write(&buf[offset..]) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }

    flush(inner)
}

fn flush<W: Write>(inner: &mut W) -> Result<()> {
    loop {
        match inner.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}
