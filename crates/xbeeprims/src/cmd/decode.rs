use std::fs;
use std::io::{Cursor, Read};

use xbeeprims_frame::{DecodeStats, Frame, FrameError, FrameReader};

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_frames, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = read_input(&args)?;
    let wire = if args.hex {
        let text = String::from_utf8(input)
            .map_err(|_| CliError::new(DATA_INVALID, "--hex input is not valid UTF-8"))?;
        parse_hex(&text)?
    } else {
        input
    };

    let (frames, stats) = decode_all(&wire)?;
    print_frames(&frames, format);

    tracing::info!(
        frames = stats.frames,
        checksum_mismatches = stats.checksum_mismatches,
        malformed = stats.malformed,
        skipped_bytes = stats.skipped_bytes,
        "decode finished"
    );

    if args.strict && stats.discarded() > 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("{} frame candidate(s) discarded", stats.discarded()),
        ));
    }
    Ok(SUCCESS)
}

fn read_input(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    match &args.file {
        Some(path) if path.as_os_str() != "-" => fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err)),
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .map_err(|err| io_error("failed reading stdin", err))?;
            Ok(buf)
        }
    }
}

/// Decode every valid frame in `wire`. A trailing partial frame is ignored.
fn decode_all(wire: &[u8]) -> CliResult<(Vec<Frame>, DecodeStats)> {
    let mut reader = FrameReader::new(Cursor::new(wire));
    let mut frames = Vec::new();
    loop {
        match reader.read_frame() {
            Ok(frame) => frames.push(frame),
            Err(FrameError::ConnectionClosed) => break,
            Err(err) => return Err(frame_error("decode failed", err)),
        }
    }

    let consumed = reader.get_ref().position() as usize;
    if consumed < wire.len() {
        tracing::debug!(trailing = wire.len() - consumed, "ignoring unread input");
    }
    Ok((frames, reader.stats()))
}
