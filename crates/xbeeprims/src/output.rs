use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use xbeeprims_frame::{Frame, HexBytes};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One decoded frame, flattened for JSON output.
#[derive(Serialize, Debug, PartialEq)]
pub struct FrameOutput {
    pub kind: &'static str,
    pub frame_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rssi: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u8>,
    pub data_hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_text: Option<String>,
}

impl FrameOutput {
    pub fn from_frame(frame: &Frame) -> Self {
        let mut out = Self {
            kind: kind_name(frame),
            frame_type: format!("{:02X}", frame.frame_type()),
            id: None,
            address: None,
            options: None,
            rssi: None,
            status: None,
            data_hex: String::new(),
            data_text: None,
        };
        let data: &[u8] = match frame {
            Frame::Generic(g) => &g.raw,
            Frame::TxRequest(tx) => {
                out.id = Some(tx.id);
                out.address = Some(tx.destination.to_string());
                out.options = Some(tx.options);
                &tx.payload
            }
            Frame::TxStatus(s) => {
                out.id = Some(s.id);
                out.status = Some(s.status);
                &[]
            }
            Frame::RxIndicate(rx) => {
                out.address = Some(rx.source.to_string());
                out.rssi = Some(rx.rssi);
                out.options = Some(rx.options);
                &rx.payload
            }
        };
        out.data_hex = HexBytes(data).to_string();
        out.data_text = std::str::from_utf8(data)
            .ok()
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        out
    }
}

pub fn kind_name(frame: &Frame) -> &'static str {
    match frame {
        Frame::Generic(_) => "generic",
        Frame::TxRequest(_) => "tx_request",
        Frame::TxStatus(_) => "tx_status",
        Frame::RxIndicate(_) => "rx_indicate",
    }
}

/// Print frames in `format`. Table output renders all frames in one table.
pub fn print_frames(frames: &[Frame], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for frame in frames {
                println!(
                    "{}",
                    serde_json::to_string(&FrameOutput::from_frame(frame))
                        .unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "ID", "ADDRESS", "OPTIONS", "RSSI/STATUS", "DATA"]);
            for frame in frames {
                let out = FrameOutput::from_frame(frame);
                table.add_row(vec![
                    format!("{} ({})", out.kind, out.frame_type),
                    hex_cell(out.id),
                    out.address.unwrap_or_default(),
                    hex_cell(out.options),
                    hex_cell(out.rssi.or(out.status)),
                    out.data_text.unwrap_or(out.data_hex),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for frame in frames {
                println!("{frame}");
            }
        }
    }
}

pub fn print_raw(data: &[u8]) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(data)?;
    out.flush()
}

fn hex_cell(value: Option<u8>) -> String {
    value.map(|v| format!("{v:02X}")).unwrap_or_default()
}
