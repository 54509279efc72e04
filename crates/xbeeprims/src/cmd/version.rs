use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("xbeeprims {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: xbeeprims");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("XBEEPRIMS_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "frame_types: TX64 (0x{:02X}), TX-Status (0x{:02X}), RX64 (0x{:02X})",
        xbeeprims_frame::TX64_REQUEST,
        xbeeprims_frame::TX_STATUS,
        xbeeprims_frame::RX64_INDICATOR
    );
    println!(
        "features: mailbox={}, async={}, cli=true",
        cfg!(feature = "mailbox"),
        cfg!(feature = "async")
    );

    Ok(SUCCESS)
}
