#[path = "../bin_common.rs"]
mod common;

use clap::Parser;
use common::{LineArgs, format_sample_line, init_tracing, parse_device_id, shutdown_token};
use fuji_vfd_rs::{Poller, Profile, SerialTransport};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "vfd-poll")]
#[command(about = "Continuously read temperature and humidity from a Fuji VFD")]
struct Args {
    #[command(flatten)]
    line: LineArgs,

    /// Device id of the drive
    #[arg(short, long, value_parser = parse_device_id, default_value = "9")]
    device: u8,

    /// Register layout and calibration
    #[arg(long, value_enum, default_value_t = Profile::CurrentLoop)]
    profile: Profile,

    /// Polling interval in seconds (minimum 1)
    #[arg(long, default_value_t = 2)]
    poll_interval: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();
    let settings = args.line.settings();
    let poll_interval = Duration::from_secs(args.poll_interval.max(1));

    tracing::info!("Opening {} ({})...", args.line.port, settings);
    let mut transport = SerialTransport::new(&args.line.port, &settings, args.device).await?;

    let channels = args.profile.channels();
    let registers: Vec<u16> = channels.iter().map(|c| c.address).collect();
    println!(
        "Connected. Reading device {} registers {:?} every {}s...\n",
        args.device,
        registers,
        poll_interval.as_secs()
    );

    let cancel = shutdown_token();
    let samples = Poller::new(&mut transport, args.device, channels)
        .with_interval(poll_interval)
        .run(cancel, |sample| {
            println!(
                "[{}]  {}",
                sample.timestamp.format("%H:%M:%S"),
                format_sample_line(&sample.measurements)
            );
        })
        .await;

    println!("\nStopped after {} sample(s).", samples);
    Ok(())
}
