use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use xbeeprims_frame::{DecodeStats, Frame, FrameError, XBeeCodec};

use crate::config::{MailboxConfig, MailboxReport};
use crate::error::{MailboxError, Result};

/// Async counterpart of [`crate::Mailbox`] built on tokio tasks.
///
/// `poll_interval` and `write_timeout` are ignored: the tasks stop as soon
/// as the cancellation token fires.
pub struct AsyncMailbox {
    inbox: mpsc::Receiver<Frame>,
    outbox: mpsc::Sender<Frame>,
    cancel: CancellationToken,
    reader: Option<JoinHandle<Result<DecodeStats>>>,
    writer: Option<JoinHandle<Result<u64>>>,
}

impl AsyncMailbox {
    /// Split `io` and spawn the reader and writer tasks on the current runtime.
    pub fn spawn<T>(io: T, config: MailboxConfig) -> Result<Self>
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        config.validate()?;
        let (read_half, write_half) = tokio::io::split(io);
        let (inbox_tx, inbox_rx) = mpsc::channel(config.inbox_capacity);
        let (outbox_tx, outbox_rx) = mpsc::channel(config.outbox_capacity);
        let cancel = CancellationToken::new();

        let reader = tokio::spawn(run_reader(
            FramedRead::new(read_half, XBeeCodec::new()),
            inbox_tx,
            cancel.clone(),
        ));
        let writer = tokio::spawn(run_writer(
            FramedWrite::new(write_half, XBeeCodec::new()),
            outbox_rx,
            cancel.clone(),
        ));

        Ok(Self {
            inbox: inbox_rx,
            outbox: outbox_tx,
            cancel,
            reader: Some(reader),
            writer: Some(writer),
        })
    }

    /// Wait for the next inbound frame. `Closed` once the reader has stopped.
    pub async fn recv(&mut self) -> Result<Frame> {
        self.inbox.recv().await.ok_or(MailboxError::Closed)
    }

    /// Queue a frame for the writer task.
    pub async fn send(&self, frame: Frame) -> Result<()> {
        self.outbox
            .send(frame)
            .await
            .map_err(|_| MailboxError::Closed)
    }

    pub fn outbox(&self) -> mpsc::Sender<Frame> {
        self.outbox.clone()
    }

    /// Token that stops both tasks when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel both tasks and wait for them. Queued outbound frames are dropped.
    pub async fn shutdown(mut self) -> Result<MailboxReport> {
        self.cancel.cancel();
        let reader = self.reader.take();
        let writer = self.writer.take();
        drop(self);

        let decode = join(reader, "reader").await?.unwrap_or_default();
        let frames_written = join(writer, "writer").await?.unwrap_or_default();
        tracing::debug!(
            frames = decode.frames,
            discarded = decode.discarded(),
            frames_written,
            "async mailbox stopped"
        );
        Ok(MailboxReport {
            decode,
            frames_written,
        })
    }
}

impl Drop for AsyncMailbox {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn join<T>(handle: Option<JoinHandle<Result<T>>>, task: &'static str) -> Result<Option<T>> {
    match handle {
        Some(handle) => match handle.await {
            Ok(result) => result.map(Some),
            Err(_) => Err(MailboxError::TaskPanicked(task)),
        },
        None => Ok(None),
    }
}

async fn run_reader<R>(
    mut framed: FramedRead<R, XBeeCodec>,
    inbox: mpsc::Sender<Frame>,
    cancel: CancellationToken,
) -> Result<DecodeStats>
where
    R: AsyncRead + Unpin,
{
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = framed.next() => next,
        };
        let frame = match next {
            Some(Ok(frame)) => frame,
            None | Some(Err(FrameError::ConnectionClosed)) => {
                tracing::debug!("transport closed, reader stopping");
                break;
            }
            Some(Err(err)) => {
                tracing::warn!(error = %err, "reader stopping on transport error");
                return Err(err.into());
            }
        };

        let delivered = tokio::select! {
            _ = cancel.cancelled() => false,
            sent = inbox.send(frame) => sent.is_ok(),
        };
        if !delivered {
            break;
        }
    }
    Ok(framed.decoder().stats())
}

async fn run_writer<W>(
    mut framed: FramedWrite<W, XBeeCodec>,
    mut outbox: mpsc::Receiver<Frame>,
    cancel: CancellationToken,
) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = outbox.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };
        if let Err(err) = framed.send(frame).await {
            tracing::warn!(error = %err, "writer stopping on transport error");
            return Err(err.into());
        }
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{duplex, AsyncWriteExt};
    use tokio_util::codec::{FramedRead, FramedWrite};
    use xbeeprims_frame::{encode_frame, TxRequest, TxStatus};

    use super::*;

    #[tokio::test]
    async fn inbound_frames_arrive_in_order() {
        let (local, mut remote) = duplex(1024);
        let mut mailbox = AsyncMailbox::spawn(local, MailboxConfig::default()).unwrap();

        let mut wire = bytes::BytesMut::new();
        wire.extend_from_slice(&[0xAA, 0x00]);
        for i in 0..3u8 {
            encode_frame(&TxStatus { id: i, status: 0 }.into(), &mut wire).unwrap();
        }
        remote.write_all(&wire).await.unwrap();

        for i in 0..3u8 {
            let frame = tokio::time::timeout(Duration::from_secs(5), mailbox.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(frame, TxStatus { id: i, status: 0 }.into());
        }

        let report = mailbox.shutdown().await.unwrap();
        assert_eq!(report.decode.frames, 3);
        assert_eq!(report.decode.skipped_bytes, 2);
    }

    #[tokio::test]
    async fn outbound_frames_written_in_order() {
        let (local, remote) = duplex(1024);
        let mailbox = AsyncMailbox::spawn(local, MailboxConfig::default()).unwrap();
        let mut radio = FramedRead::new(remote, XBeeCodec::new());

        for i in 0..4u8 {
            mailbox
                .send(TxRequest::broadcast(i, format!("msg-{i}")).into())
                .await
                .unwrap();
        }
        for i in 0..4u8 {
            let frame = radio.next().await.unwrap().unwrap();
            assert_eq!(frame, TxRequest::broadcast(i, format!("msg-{i}")).into());
        }

        let report = mailbox.shutdown().await.unwrap();
        assert_eq!(report.frames_written, 4);
    }

    #[tokio::test]
    async fn recv_closed_after_peer_hangs_up() {
        let (local, remote) = duplex(256);
        let mut mailbox = AsyncMailbox::spawn(local, MailboxConfig::default()).unwrap();

        let mut radio = FramedWrite::new(remote, XBeeCodec::new());
        radio
            .send(Frame::from(TxStatus { id: 9, status: 1 }))
            .await
            .unwrap();
        drop(radio);

        assert!(mailbox.recv().await.is_ok());
        assert!(matches!(mailbox.recv().await, Err(MailboxError::Closed)));
        mailbox.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn cancellation_token_stops_tasks() {
        let (local, _remote) = duplex(256);
        let mut mailbox = AsyncMailbox::spawn(local, MailboxConfig::default()).unwrap();

        mailbox.cancellation_token().cancel();
        let closed = tokio::time::timeout(Duration::from_secs(5), mailbox.recv())
            .await
            .unwrap();
        assert!(matches!(closed, Err(MailboxError::Closed)));

        let report = mailbox.shutdown().await.unwrap();
        assert_eq!(report, MailboxReport::default());
    }

    #[tokio::test]
    async fn rejects_invalid_config() {
        let (local, _remote) = duplex(64);
        let config = MailboxConfig::default().with_outbox_capacity(0);
        assert!(matches!(
            AsyncMailbox::spawn(local, config),
            Err(MailboxError::InvalidConfig(_))
        ));
    }
}
