use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use xbeeprims_frame::{DecodeStats, Frame, FrameError, FrameReader, FrameWriter};

use crate::config::{MailboxConfig, MailboxReport};
use crate::error::{MailboxError, Result};
use crate::transport::DuplexTransport;

/// Inbox and outbox queues served by a dedicated reader thread and a
/// dedicated writer thread.
///
/// Frames arrive in the inbox in wire order and leave the outbox in
/// submission order. Dropping the mailbox signals both threads to stop;
/// [`Mailbox::shutdown`] also waits for them.
pub struct Mailbox {
    inbox: Receiver<Frame>,
    outbox: SyncSender<Frame>,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<Result<DecodeStats>>>,
    writer: Option<JoinHandle<Result<u64>>>,
}

impl Mailbox {
    /// Split `transport` into read and write handles and start both threads.
    ///
    /// The read handle gets `poll_interval` as its read timeout so the reader
    /// thread notices shutdown even on a silent link.
    pub fn spawn<T: DuplexTransport>(transport: T, config: MailboxConfig) -> Result<Self> {
        config.validate()?;
        let read_half = transport.try_clone()?;
        read_half.set_read_timeout(Some(config.poll_interval))?;
        transport.set_write_timeout(config.write_timeout)?;
        Self::from_halves(read_half, transport, config)
    }

    /// Start the mailbox over an already split transport.
    ///
    /// Shutdown of the reader thread is only prompt if `reader` times out or
    /// reaches EOF; a read that blocks forever keeps the thread parked.
    pub fn from_halves<R, W>(reader: R, writer: W, config: MailboxConfig) -> Result<Self>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        config.validate()?;
        let (inbox_tx, inbox_rx) = mpsc::sync_channel(config.inbox_capacity);
        let (outbox_tx, outbox_rx) = mpsc::sync_channel(config.outbox_capacity);
        let stop = Arc::new(AtomicBool::new(false));

        let reader = {
            let task_stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("xbee-mailbox-reader".to_string())
                .spawn(move || run_reader(FrameReader::new(reader), inbox_tx, task_stop))?
        };

        let writer = {
            let task_stop = Arc::clone(&stop);
            let poll = config.poll_interval;
            let spawned = thread::Builder::new()
                .name("xbee-mailbox-writer".to_string())
                .spawn(move || run_writer(FrameWriter::new(writer), outbox_rx, task_stop, poll));
            match spawned {
                Ok(handle) => handle,
                Err(err) => {
                    stop.store(true, Ordering::Release);
                    return Err(err.into());
                }
            }
        };

        Ok(Self {
            inbox: inbox_rx,
            outbox: outbox_tx,
            stop,
            reader: Some(reader),
            writer: Some(writer),
        })
    }

    /// Block until the next inbound frame.
    ///
    /// Returns `Err(MailboxError::Closed)` once the reader thread has stopped
    /// and the inbox is drained.
    pub fn recv(&self) -> Result<Frame> {
        self.inbox.recv().map_err(|_| MailboxError::Closed)
    }

    /// Wait up to `timeout` for the next inbound frame.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Frame> {
        match self.inbox.recv_timeout(timeout) {
            Ok(frame) => Ok(frame),
            Err(RecvTimeoutError::Timeout) => Err(MailboxError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(MailboxError::Closed),
        }
    }

    /// Take an inbound frame if one is already queued.
    pub fn try_recv(&self) -> Option<Frame> {
        self.inbox.try_recv().ok()
    }

    /// Queue a frame for the writer thread, blocking while the outbox is full.
    pub fn send(&self, frame: Frame) -> Result<()> {
        self.outbox.send(frame).map_err(|_| MailboxError::Closed)
    }

    /// Queue a frame only if the outbox has room; `Full` otherwise.
    pub fn try_send(&self, frame: Frame) -> Result<()> {
        match self.outbox.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(MailboxError::Full),
            Err(TrySendError::Disconnected(_)) => Err(MailboxError::Closed),
        }
    }

    /// A cloneable handle to the outbox for producer threads.
    pub fn outbox(&self) -> SyncSender<Frame> {
        self.outbox.clone()
    }

    /// Iterate over inbound frames until the reader stops.
    pub fn inbox(&self) -> mpsc::Iter<'_, Frame> {
        self.inbox.iter()
    }

    /// Stop both threads and wait for them.
    ///
    /// Frames still queued in the outbox are dropped. Returns the first task
    /// error, if any.
    pub fn shutdown(mut self) -> Result<MailboxReport> {
        self.stop.store(true, Ordering::Release);
        let reader = self.reader.take();
        let writer = self.writer.take();
        // Dropping the queues wakes a reader blocked on a full inbox and a
        // writer blocked on an empty outbox.
        drop(self);

        let decode = join(reader, "reader")?.unwrap_or_default();
        let frames_written = join(writer, "writer")?.unwrap_or_default();
        tracing::debug!(
            frames = decode.frames,
            discarded = decode.discarded(),
            frames_written,
            "mailbox stopped"
        );
        Ok(MailboxReport {
            decode,
            frames_written,
        })
    }
}

impl Drop for Mailbox {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}

fn join<T>(handle: Option<JoinHandle<Result<T>>>, task: &'static str) -> Result<Option<T>> {
    match handle {
        Some(handle) => match handle.join() {
            Ok(result) => result.map(Some),
            Err(_) => Err(MailboxError::TaskPanicked(task)),
        },
        None => Ok(None),
    }
}

fn run_reader<R: Read>(
    mut reader: FrameReader<R>,
    inbox: SyncSender<Frame>,
    stop: Arc<AtomicBool>,
) -> Result<DecodeStats> {
    while !stop.load(Ordering::Acquire) {
        let frame = match reader.read_frame() {
            Ok(frame) => frame,
            Err(err) if err.is_timeout() => continue,
            Err(FrameError::ConnectionClosed) => {
                tracing::debug!("transport closed, reader stopping");
                break;
            }
            Err(err) => {
                tracing::warn!(error = %err, "reader stopping on transport error");
                return Err(err.into());
            }
        };

        // Blocks while the inbox is full; shutdown drops the receiver.
        if inbox.send(frame).is_err() {
            break;
        }
    }
    Ok(reader.stats())
}

fn run_writer<W: Write>(
    mut writer: FrameWriter<W>,
    outbox: Receiver<Frame>,
    stop: Arc<AtomicBool>,
    poll: Duration,
) -> Result<u64> {
    let mut written = 0u64;
    while !stop.load(Ordering::Acquire) {
        match outbox.recv_timeout(poll) {
            Ok(frame) => {
                if let Err(err) = writer.write_frame_all(&frame) {
                    tracing::warn!(error = %err, "writer stopping on transport error");
                    return Err(err.into());
                }
                written += 1;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(written)
}
