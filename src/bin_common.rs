use fuji_vfd_rs::Measurement;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[allow(unused_imports)]
pub use fuji_vfd_rs::cli::{LineArgs, parse_block, parse_device_id};

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Cancelled on Ctrl-C.
#[allow(dead_code)]
pub fn shutdown_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let cancel_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Received shutdown signal");
        cancel_signal.cancel();
    });
    cancel
}

#[allow(dead_code)]
pub fn print_measurements(measurements: &[Measurement]) {
    for m in measurements {
        println!("  {:<20} {:>10}", format!("{}:", m.label), m.value.to_string());
    }
    let raw: Vec<String> = measurements
        .iter()
        .map(|m| format!("{}={}", m.address, m.raw_value()))
        .collect();
    println!("  Raw (wire addr=value): {}", raw.join(", "));

    let inputs: Vec<String> = measurements
        .iter()
        .filter_map(|m| m.input_voltage.map(|v| format!("{}={:.3} V", m.label, v)))
        .collect();
    if !inputs.is_empty() {
        println!("  Input voltages: {}", inputs.join(", "));
    }
}

/// One line per sample, for the polling tools.
#[allow(dead_code)]
pub fn format_sample_line(measurements: &[Measurement]) -> String {
    measurements
        .iter()
        .map(|m| format!("{}: raw={:5} -> {}", m.label, m.raw, m.value))
        .collect::<Vec<_>>()
        .join("  ")
}
