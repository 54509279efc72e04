//! Mailbox talking to a simulated radio over TCP loopback.
//!
//! The radio thread acknowledges every TX request with a TX status and
//! echoes the payload back as an RX indication from its own address.
//!
//! Run with:
//!   cargo run --example loopback --features mailbox

use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use xbeeprims::frame::{Address, Frame, FrameError, FrameStream, RxIndicate, TxRequest, TxStatus};
use xbeeprims::mailbox::{Mailbox, MailboxConfig};

const RADIO_ADDRESS: u64 = 0x0013_A200_4052_1234;

fn simulated_radio(stream: TcpStream) -> Result<(), FrameError> {
    let mut radio = FrameStream::new(stream);
    loop {
        let frame = match radio.read_frame() {
            Ok(frame) => frame,
            Err(FrameError::ConnectionClosed) => return Ok(()),
            Err(err) => return Err(err),
        };
        let Frame::TxRequest(tx) = frame else {
            continue;
        };
        radio.write_frame_all(&TxStatus { id: tx.id, status: 0 }.into())?;
        radio.write_frame_all(
            &RxIndicate {
                source: Address::from(RADIO_ADDRESS),
                rssi: 0x28,
                options: 0,
                payload: tx.payload,
            }
            .into(),
        )?;
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let radio = thread::spawn(move || -> Result<(), FrameError> {
        let (stream, _) = listener.accept()?;
        simulated_radio(stream)
    });

    let mailbox = Mailbox::spawn(
        TcpStream::connect(addr)?,
        MailboxConfig::default().with_poll_interval(Duration::from_millis(50)),
    )?;

    for (id, text) in ["hello", "from", "the mailbox"].into_iter().enumerate() {
        mailbox.send(TxRequest::broadcast(id as u8 + 1, text).into())?;
    }

    for _ in 0..6 {
        let frame = mailbox.recv_timeout(Duration::from_secs(2))?;
        println!("{frame}");
    }

    let report = mailbox.shutdown()?;
    eprintln!(
        "frames read: {}, written: {}, discarded: {}",
        report.decode.frames,
        report.frames_written,
        report.decode.discarded()
    );

    let _ = radio.join();
    Ok(())
}
