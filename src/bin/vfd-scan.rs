#[path = "../bin_common.rs"]
mod common;

use clap::{Parser, Subcommand};
use common::{LineArgs, init_tracing, parse_block, parse_device_id, shutdown_token};
use fuji_vfd_rs::scan::{
    CONNECTIVITY_CHECK, ChangeWatcher, DEFAULT_BLOCK_SIZE, DEFAULT_BLOCKS,
    DEFAULT_CHANGE_THRESHOLD, DEFAULT_SPAN_COUNT, DEFAULT_SPAN_START, DEFAULT_TOLERANCE,
    default_targets, find_matches, probe_blocks, read_span,
};
use fuji_vfd_rs::{Addressing, SerialTransport, Transport};
use std::io::Write;
use std::time::Duration;
use fuji_vfd_rs::cli::spawn_line_reader;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

/// Number of words shown per block.
const SAMPLE_WORDS: usize = 10;

#[derive(Parser)]
#[command(name = "vfd-scan")]
#[command(about = "Probe Fuji VFD holding-register ranges for live sensor data")]
struct Args {
    #[command(flatten)]
    line: LineArgs,

    /// Device id of the drive
    #[arg(short, long, value_parser = parse_device_id, default_value = "9")]
    device: u8,

    /// How register numbers given on the command line are counted
    #[arg(long, value_enum, default_value_t = Addressing::Wire)]
    addressing: Addressing,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read a set of register blocks once and report which ones answer
    Blocks {
        /// Block to probe as START:COUNT (repeatable); defaults to the common Fuji ranges
        #[arg(short, long = "block", value_parser = parse_block)]
        blocks: Vec<(u16, u16)>,
    },
    /// Find registers matching the temperature and humidity shown on the drive
    Match {
        /// First register of the span
        #[arg(long, default_value_t = DEFAULT_SPAN_START)]
        start: u16,

        /// Number of registers to scan
        #[arg(long, default_value_t = DEFAULT_SPAN_COUNT)]
        count: u16,

        /// Registers per request (at most 125)
        #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: u16,

        /// Largest accepted difference between scaled and displayed value
        #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f32,
    },
    /// Print registers whose value jumps between samples
    Watch {
        /// First register of the span
        #[arg(long, default_value_t = DEFAULT_SPAN_START)]
        start: u16,

        /// Number of registers to watch
        #[arg(long, default_value_t = 50)]
        count: u16,

        /// Smallest change that is reported is this plus one
        #[arg(long, default_value_t = DEFAULT_CHANGE_THRESHOLD)]
        threshold: u16,

        /// Sampling interval in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();
    let settings = args.line.settings();

    println!("Opening {} ({})...", args.line.port, settings);
    let mut transport = SerialTransport::new(&args.line.port, &settings, args.device).await?;
    println!("Connected.\n");

    match args.command {
        Command::Blocks { blocks } => {
            let blocks = if blocks.is_empty() {
                DEFAULT_BLOCKS.to_vec()
            } else {
                blocks
                    .into_iter()
                    .map(|(start, count)| -> fuji_vfd_rs::Result<(u16, u16)> {
                        Ok((args.addressing.to_wire(start)?, count))
                    })
                    .collect::<fuji_vfd_rs::Result<Vec<_>>>()?
            };
            run_blocks(&mut transport, args.device, &blocks, args.addressing).await;
        }
        Command::Match {
            start,
            count,
            block_size,
            tolerance,
        } => {
            let start = args.addressing.to_wire(start)?;
            let cancel = shutdown_token();
            run_match(
                &mut transport,
                args.device,
                start,
                count,
                block_size,
                tolerance,
                args.addressing,
                cancel,
            )
            .await?;
        }
        Command::Watch {
            start,
            count,
            threshold,
            interval_ms,
        } => {
            let start = args.addressing.to_wire(start)?;
            let cancel = shutdown_token();
            run_watch(
                &mut transport,
                args.device,
                start,
                count,
                threshold,
                Duration::from_millis(interval_ms.max(1)),
                args.addressing,
                cancel,
            )
            .await;
        }
    }

    Ok(())
}

async fn run_blocks(
    transport: &mut SerialTransport,
    device_id: u8,
    blocks: &[(u16, u16)],
    addressing: Addressing,
) {
    println!("Probing {} register block(s) on device {}...\n", blocks.len(), device_id);

    for report in probe_blocks(transport, device_id, blocks).await {
        let first = addressing.from_wire(report.start);
        let last = addressing.from_wire(report.end());
        match &report.result {
            Ok(words) => {
                println!("Addr {}-{}: OK ({} registers read)", first, last, words.len());
                println!("   Sample: {:?}", &words[..words.len().min(SAMPLE_WORDS)]);
            }
            Err(e) if e.is_timeout() => {
                println!("Addr {}-{}: No response / invalid", first, last);
            }
            Err(e) => println!("Addr {}-{}: {}", first, last, e),
        }
    }

    println!("\nScan complete. Blocks showing OK contain live data.");
}

#[allow(clippy::too_many_arguments)]
async fn run_match(
    transport: &mut SerialTransport,
    device_id: u8,
    start: u16,
    count: u16,
    block_size: u16,
    tolerance: f32,
    addressing: Addressing,
    cancel: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Testing communication with device {}...", device_id);
    let (check_start, check_count) = CONNECTIVITY_CHECK;
    match transport
        .read_holding_registers(device_id, check_start, check_count)
        .await
    {
        Ok(words) => println!("Test read OK. Sample data: {:?}\n", words),
        Err(e) => {
            println!("Test read failed. Try adjusting the device id, baud rate, or parity.");
            return Err(e.into());
        }
    }

    println!(
        "Scanning {} registers from address {} on each round.\n",
        count,
        addressing.from_wire(start)
    );

    let mut lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    loop {
        let Some(temperature) = prompt(
            &mut lines,
            "Enter current Temperature (°C) from VFD: ",
            &cancel,
        )
        .await?
        else {
            break;
        };
        let Some(humidity) =
            prompt(&mut lines, "Enter current Humidity (%RH) from VFD: ", &cancel).await?
        else {
            break;
        };

        let span = read_span(transport, device_id, start, count, block_size).await;
        if let Some((address, e)) = &span.failure {
            println!("Modbus read error at {}: {}", addressing.from_wire(*address), e);
        }
        if span.values.is_empty() {
            println!("No data read. Check address range or VFD mapping.");
            continue;
        }

        let targets = default_targets(temperature, humidity);
        let found = find_matches(span.start, &span.values, &targets, tolerance);
        if found.is_empty() {
            println!("\nNo close matches found. Try again or change range.");
        } else {
            println!("\nPossible matching registers:");
            for c in &found {
                println!(
                    "  -> Reg {}: raw={} ~ {:.2} ({})",
                    addressing.from_wire(c.address),
                    c.raw,
                    c.scaled,
                    c.label
                );
            }
        }
        println!("\n----------------------------------------------\n");
    }

    println!("\nExiting...");
    Ok(())
}

/// Ask until a number is entered. `None` on end of input or Ctrl-C.
async fn prompt(
    lines: &mut UnboundedReceiver<std::io::Result<String>>,
    question: &str,
    cancel: &CancellationToken,
) -> Result<Option<f32>, Box<dyn std::error::Error>> {
    loop {
        print!("{}", question);
        std::io::stdout().flush()?;

        let line = tokio::select! {
            _ = cancel.cancelled() => return Ok(None),
            line = lines.recv() => line,
        };
        let Some(line) = line.transpose()? else {
            return Ok(None);
        };

        match line.trim().parse::<f32>() {
            Ok(value) => return Ok(Some(value)),
            Err(e) => println!("Not a number ({}), try again.", e),
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_watch(
    transport: &mut SerialTransport,
    device_id: u8,
    start: u16,
    count: u16,
    threshold: u16,
    period: Duration,
    addressing: Addressing,
    cancel: CancellationToken,
) {
    println!(
        "Monitoring {} registers from {}...\n",
        count,
        addressing.from_wire(start)
    );

    let mut watcher = ChangeWatcher::new(start, count, threshold);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let span = read_span(transport, device_id, start, count, DEFAULT_BLOCK_SIZE).await;
        if !span.is_complete() {
            println!("Read error.");
            continue;
        }
        for change in watcher.update(&span.values) {
            println!(
                "Reg {}: {}",
                addressing.from_wire(change.address),
                change.current
            );
        }
    }

    println!("\nExiting...");
}
