#[path = "../bin_common.rs"]
mod common;

use clap::Parser;
use common::{LineArgs, init_tracing, parse_device_id, print_measurements};
use fuji_vfd_rs::{Profile, SerialTransport, read_channels};

#[derive(Parser)]
#[command(name = "vfd-read")]
#[command(about = "Read sensor registers once from one or more Fuji VFDs")]
struct Args {
    #[command(flatten)]
    line: LineArgs,

    /// Device ids to read (hex values like 0x09 or decimal)
    #[arg(short, long, value_parser = parse_device_id, value_delimiter = ',', default_values_t = vec![2u8, 4, 7, 9])]
    devices: Vec<u8>,

    /// Register layout and calibration
    #[arg(long, value_enum, default_value_t = Profile::Calibrated)]
    profile: Profile,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();
    let settings = args.line.settings();

    if args.devices.is_empty() {
        return Err("no device ids given".into());
    }

    println!("Opening {} ({})...", args.line.port, settings);
    let mut transport = SerialTransport::new(&args.line.port, &settings, args.devices[0]).await?;
    println!("Reading data from Modbus devices...\n");

    let channels = args.profile.channels();
    let mut failures = 0;
    for &device_id in &args.devices {
        println!("--- Device ID: {} ---", device_id);
        match read_channels(&mut transport, device_id, &channels).await {
            Ok(measurements) => print_measurements(&measurements),
            Err(e) => {
                failures += 1;
                tracing::debug!("Device {}: {:?}", device_id, e);
                println!("  Read error on device {}: {}", device_id, e);
            }
        }
        println!();
    }

    drop(transport);
    println!("Connection closed.");

    if failures == args.devices.len() {
        return Err("no device answered".into());
    }
    Ok(())
}
