use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::{usage, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode captured wire bytes and print every valid frame.
    Decode(DecodeArgs),
    /// Encode a frame envelope to stdout.
    #[command(subcommand)]
    Encode(EncodeCommand),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(cmd) => encode::run(cmd),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file to read. Reads stdin when omitted or `-`.
    pub file: Option<PathBuf>,
    /// Input is a hex dump (whitespace and `:` ignored) instead of raw bytes.
    #[arg(long)]
    pub hex: bool,
    /// Exit with status 60 if any frame candidate was discarded.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Subcommand, Debug)]
pub enum EncodeCommand {
    /// TX request to a 64-bit destination (type 0x00).
    Tx(TxArgs),
    /// TX status report (type 0x89).
    TxStatus(TxStatusArgs),
    /// Any frame type with hex frame data.
    Raw(RawArgs),
}

#[derive(Args, Debug)]
pub struct EncodeOutput {
    /// Print the envelope as hex instead of raw bytes.
    #[arg(long)]
    pub hex: bool,
}

#[derive(Args, Debug)]
pub struct TxArgs {
    /// Frame id (0 disables the TX status report).
    #[arg(long, default_value = "1", value_parser = parse_u8)]
    pub id: u8,
    /// Destination: 16 hex digits or `broadcast`.
    #[arg(long, default_value = "broadcast")]
    pub dest: String,
    /// Transmit options byte.
    #[arg(long, default_value = "0", value_parser = parse_u8)]
    pub options: u8,
    /// UTF-8 payload.
    #[arg(long, conflicts_with = "data_hex", default_value = "")]
    pub data: String,
    /// Payload as hex.
    #[arg(long)]
    pub data_hex: Option<String>,
    #[command(flatten)]
    pub output: EncodeOutput,
}

#[derive(Args, Debug)]
pub struct TxStatusArgs {
    #[arg(long, value_parser = parse_u8)]
    pub id: u8,
    /// Delivery status (0 = success).
    #[arg(long, default_value = "0", value_parser = parse_u8)]
    pub status: u8,
    #[command(flatten)]
    pub output: EncodeOutput,
}

#[derive(Args, Debug)]
pub struct RawArgs {
    /// Frame type tag.
    #[arg(long, value_parser = parse_u8)]
    pub tag: u8,
    /// Frame data following the tag, as hex.
    #[arg(long, default_value = "")]
    pub data_hex: String,
    #[command(flatten)]
    pub output: EncodeOutput,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a byte given in decimal or `0x` hex.
pub fn parse_u8(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let parsed = match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("expected a byte (0-255 or 0x00-0xFF), got {input:?}"))
}

/// Parse a hex dump. Whitespace, `:` and a leading `0x` are ignored.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<u8> = body
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();
    if digits.len() % 2 != 0 {
        return Err(usage("hex input has an odd number of digits"));
    }

    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).map_err(|_| usage("hex input is not ASCII"))?;
            u8::from_str_radix(text, 16)
                .map_err(|_| usage(format!("invalid hex digits {text:?}")))
        })
        .collect()
}
