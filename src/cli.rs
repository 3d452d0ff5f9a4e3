//! Command-line pieces shared by the tools.

use crate::line::{LineSettings, Parity, StopBits};
use clap::Args;
use std::io::{self, BufRead};
use std::time::Duration;
use tokio::sync::mpsc;

/// Serial line options shared by every tool.
#[derive(Args, Debug, Clone)]
pub struct LineArgs {
    /// Serial port path (e.g., /dev/ttyUSB0 or COM4)
    #[arg(short, long)]
    pub port: String,

    /// Baud rate
    #[arg(short = 'r', long, default_value_t = 9600)]
    pub baud_rate: u32,

    /// Parity: N, E or O
    #[arg(long, default_value = "E")]
    pub parity: Parity,

    /// Stop bits: 1 or 2
    #[arg(long, default_value = "1")]
    pub stop_bits: StopBits,

    /// Response timeout in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub timeout_ms: u64,
}

impl LineArgs {
    pub fn settings(&self) -> LineSettings {
        LineSettings::new(self.baud_rate, self.parity, self.stop_bits)
            .with_timeout(Duration::from_millis(self.timeout_ms.max(1)))
    }
}

/// Device id in decimal or `0x` hex.
pub fn parse_device_id(s: &str) -> Result<u8, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse()
            .map_err(|e: std::num::ParseIntError| e.to_string())
    }
}

/// `START:COUNT`, e.g. `2100:50`.
pub fn parse_block(s: &str) -> Result<(u16, u16), String> {
    let (start, count) = s
        .split_once(':')
        .ok_or_else(|| format!("expected START:COUNT, got '{}'", s))?;
    let start = start.trim().parse().map_err(|e| format!("start: {}", e))?;
    let count = count.trim().parse().map_err(|e| format!("count: {}", e))?;
    Ok((start, count))
}

/// Forward lines from a blocking reader over a channel.
///
/// The reader runs on its own OS thread rather than the runtime's blocking
/// pool, so shutting the runtime down never waits on a pending read. The
/// channel closes at end of input or after the first read error.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::UnboundedReceiver<io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if tx.send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}
