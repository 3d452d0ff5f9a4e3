#[path = "../bin_common.rs"]
mod common;

use clap::Parser;
use common::{init_tracing, parse_device_id};
use fuji_vfd_rs::{LineSettings, Parity, Phase, SerialConnector, StopBits, SweepPlan, detect};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "vfd-detect")]
#[command(about = "Find the baud rate, parity, stop bits and device id a Fuji VFD answers on")]
struct Args {
    /// Serial port path (e.g., /dev/ttyUSB0 or COM4)
    #[arg(short, long)]
    port: String,

    /// Baud rates for the expanded sweep
    #[arg(long = "baud", value_delimiter = ',', default_values_t = vec![9600u32])]
    baud_rates: Vec<u32>,

    /// Parities for the expanded sweep (N, E, O)
    #[arg(long = "parity", value_delimiter = ',', default_value = "E")]
    parities: Vec<Parity>,

    /// Stop bits for the expanded sweep (1, 2)
    #[arg(long = "stop-bits", value_delimiter = ',', default_value = "1")]
    stop_bits: Vec<StopBits>,

    /// First device id of the expanded sweep
    #[arg(long, value_parser = parse_device_id, default_value = "1")]
    first_id: u8,

    /// Last device id of the expanded sweep
    #[arg(long, value_parser = parse_device_id, default_value = "31")]
    last_id: u8,

    /// Register probed on each device
    #[arg(long, default_value_t = 1)]
    probe_address: u16,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 200)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    if args.first_id > args.last_id {
        return Err("invalid device id range".into());
    }
    if args.baud_rates.is_empty() || args.parities.is_empty() || args.stop_bits.is_empty() {
        return Err("nothing to sweep".into());
    }

    let plan = SweepPlan {
        default: LineSettings::default(),
        default_ids: vec![1],
        baud_rates: args.baud_rates,
        parities: args.parities,
        stop_bits: args.stop_bits,
        device_ids: (args.first_id..=args.last_id).collect(),
        probe_address: args.probe_address,
        probe_count: 1,
        timeout: Duration::from_millis(args.timeout_ms.max(1)),
    };

    println!("Scanning {} for Fuji VFD communication parameters...\n", args.port);
    let connector = SerialConnector::new(args.port);

    match detect(&connector, &plan).await {
        Some(found) => {
            println!("Communication found!");
            println!("   Baud Rate : {}", found.settings.baud_rate);
            println!("   Parity    : {}", found.settings.parity);
            println!("   Stop Bits : {}", found.settings.stop_bits);
            println!("   Device ID : {}", found.device_id);
            println!("   Probe     : {:?}", found.registers);
            if found.phase == Phase::Default {
                println!("   (factory defaults)");
            }
            println!("Compare with the drive's communication function codes (y01-y10).");
            Ok(())
        }
        None => {
            println!("No Modbus response found. Check wiring, power, or RS-485 polarity.");
            Err("no device found".into())
        }
    }
}
