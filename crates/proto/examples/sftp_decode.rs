//! SFTP Frame Decoder Example
//!
//! Reads hex-encoded SFTP frames, one per line, and prints each decoded
//! packet. Useful for inspecting frames captured from a live session.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example sftp_decode -- <request|response> [config.toml] < frames.hex
//! ```
//!
//! # Example
//!
//! ```bash
//! echo 00000015120000002a000000042f666f6f000000042f626172 \
//!     | cargo run --example sftp_decode -- request
//! ```
//!
//! The optional config file is read for its `[codec]` table; frames longer
//! than `max_packet_length` are reported instead of decoded.

use filexfer_platform::CodecConfig;
use filexfer_proto::sftp::{RequestPacket, ResponsePacket};
use std::env;
use std::io::{self, BufRead};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 || !matches!(args[1].as_str(), "request" | "response") {
        eprintln!("Usage: {} <request|response> [config.toml] < frames.hex", args[0]);
        eprintln!();
        eprintln!("Environment variables:");
        eprintln!("  RUST_LOG=trace    Log every decoded frame header");
        std::process::exit(1);
    }
    let requests = args[1] == "request";

    let config = match args.get(2) {
        Some(path) => CodecConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => CodecConfig::default(),
    };

    for (lineno, line) in io::stdin().lock().lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let frame = match hex::decode(line) {
            Ok(frame) => frame,
            Err(e) => {
                println!("{}: invalid hex: {}", lineno + 1, e);
                continue;
            }
        };
        if frame.len().saturating_sub(4) > config.max_packet_length as usize {
            println!(
                "{}: frame of {} bytes exceeds max_packet_length {}",
                lineno + 1,
                frame.len(),
                config.max_packet_length
            );
            continue;
        }

        if requests {
            match RequestPacket::decode(&frame[..]) {
                Ok(p) => println!("{}: id={} {:?}", lineno + 1, p.request_id, p.request),
                Err(e) => println!("{}: {}", lineno + 1, e),
            }
        } else {
            match ResponsePacket::decode(&frame[..]) {
                Ok(p) => println!("{}: id={} {:?}", lineno + 1, p.request_id, p.response),
                Err(e) => println!("{}: {}", lineno + 1, e),
            }
        }
    }

    Ok(())
}
