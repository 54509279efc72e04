use bytes::BytesMut;
use xbeeprims_frame::{encode_frame, Address, Frame, HexBytes, TxRequest, TxStatus, BROADCAST_ADDRESS};

use crate::cmd::{parse_hex, EncodeCommand, EncodeOutput, RawArgs, TxArgs};
use crate::exit::{frame_error, io_error, usage, CliResult, SUCCESS};
use crate::output::print_raw;

pub fn run(cmd: EncodeCommand) -> CliResult<i32> {
    let (frame, output) = build_frame(cmd)?;

    let mut envelope = BytesMut::new();
    encode_frame(&frame, &mut envelope).map_err(|err| frame_error("encode failed", err))?;
    tracing::debug!(frame = %frame, bytes = envelope.len(), "encoded frame");

    if output.hex {
        println!("{}", HexBytes(&envelope));
    } else {
        print_raw(&envelope).map_err(|err| io_error("failed writing stdout", err))?;
    }
    Ok(SUCCESS)
}

fn build_frame(cmd: EncodeCommand) -> CliResult<(Frame, EncodeOutput)> {
    match cmd {
        EncodeCommand::Tx(args) => {
            let frame = tx_request(&args)?;
            Ok((frame, args.output))
        }
        EncodeCommand::TxStatus(args) => Ok((
            TxStatus {
                id: args.id,
                status: args.status,
            }
            .into(),
            args.output,
        )),
        EncodeCommand::Raw(args) => {
            let frame = raw_frame(&args)?;
            Ok((frame, args.output))
        }
    }
}

fn tx_request(args: &TxArgs) -> CliResult<Frame> {
    let destination = parse_destination(&args.dest)?;
    let payload = match &args.data_hex {
        Some(hex) => parse_hex(hex)?,
        None => args.data.as_bytes().to_vec(),
    };
    Ok(TxRequest::new(args.id, destination, payload)
        .with_options(args.options)
        .into())
}

fn raw_frame(args: &RawArgs) -> CliResult<Frame> {
    let mut frame_data = vec![args.tag];
    frame_data.extend(parse_hex(&args.data_hex)?);
    // A known tag decodes to its typed variant; short data is rejected here.
    Frame::decode(frame_data).map_err(|err| frame_error("invalid frame data", err))
}

fn parse_destination(input: &str) -> CliResult<Address> {
    if input.eq_ignore_ascii_case("broadcast") {
        return Ok(BROADCAST_ADDRESS);
    }
    input.parse().map_err(|err| usage(format!("--dest: {err}")))
}
