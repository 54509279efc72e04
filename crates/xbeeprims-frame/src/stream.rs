use std::io::{Read, Write};

use bytes::BytesMut;

use crate::codec::{DecodeStats, FrameDecoder};
use crate::error::Result;
use crate::frame::Frame;
use crate::reader::read_frame_from;
use crate::writer::{write_frame_all_to, write_frame_to};

/// A duplex transport carrying XBee API frames in both directions.
///
/// One owner reads and writes. To read and write from different threads,
/// split the transport and use [`crate::FrameReader`] and
/// [`crate::FrameWriter`] instead.
pub struct FrameStream<T> {
    inner: T,
    read_buf: BytesMut,
    write_buf: BytesMut,
    decoder: FrameDecoder,
}

impl<T: Read + Write> FrameStream<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            read_buf: BytesMut::new(),
            write_buf: BytesMut::new(),
            decoder: FrameDecoder::new(),
        }
    }

    /// Read the next valid frame (blocking). See [`crate::FrameReader::read_frame`].
    pub fn read_frame(&mut self) -> Result<Frame> {
        read_frame_from(&mut self.inner, &mut self.read_buf, &mut self.decoder)
    }

    /// Write one envelope with a single transport write. See [`crate::FrameWriter::write_frame`].
    pub fn write_frame(&mut self, frame: &Frame) -> Result<usize> {
        write_frame_to(&mut self.inner, &mut self.write_buf, frame)
    }

    /// Write one envelope completely.
    pub fn write_frame_all(&mut self, frame: &Frame) -> Result<()> {
        write_frame_all_to(&mut self.inner, &mut self.write_buf, frame)
    }

    pub fn stats(&self) -> DecodeStats {
        self.decoder.stats()
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}
