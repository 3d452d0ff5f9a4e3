//! Communication parameter sweep.
//!
//! A drive with unknown RS-485 settings is found by trying the Fuji factory
//! combination first and then every combination of baud rate, parity and
//! stop bits against every candidate device id, until one of them answers a
//! holding-register read.

use crate::line::{LineSettings, Parity, StopBits};
use crate::transport::{Connector, Transport};
use std::ops::RangeInclusive;
use std::time::Duration;

pub const DEFAULT_SCAN_IDS: RangeInclusive<u8> = 1..=31;

/// Short, so a silent combination is abandoned quickly.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Matched with the factory defaults.
    Default,
    /// Matched during the expanded sweep.
    Sweep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub settings: LineSettings,
    pub device_id: u8,
    pub phase: Phase,
    /// Words returned by the successful probe.
    pub registers: Vec<u16>,
}

#[derive(Debug, Clone)]
pub struct SweepPlan {
    pub default: LineSettings,
    pub default_ids: Vec<u8>,
    pub baud_rates: Vec<u32>,
    pub parities: Vec<Parity>,
    pub stop_bits: Vec<StopBits>,
    pub device_ids: Vec<u8>,
    pub probe_address: u16,
    pub probe_count: u16,
    pub timeout: Duration,
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            default: LineSettings::default(),
            default_ids: vec![1],
            baud_rates: vec![9600],
            parities: vec![Parity::Even],
            stop_bits: vec![StopBits::One],
            device_ids: DEFAULT_SCAN_IDS.collect(),
            probe_address: 1,
            probe_count: 1,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl SweepPlan {
    /// The expanded sweep in trial order: baud rate outermost, then parity,
    /// then stop bits.
    pub fn combinations(&self) -> Vec<LineSettings> {
        let mut combos =
            Vec::with_capacity(self.baud_rates.len() * self.parities.len() * self.stop_bits.len());
        for &baud_rate in &self.baud_rates {
            for &parity in &self.parities {
                for &stop_bits in &self.stop_bits {
                    combos.push(
                        LineSettings::new(baud_rate, parity, stop_bits).with_timeout(self.timeout),
                    );
                }
            }
        }
        combos
    }

    fn default_settings(&self) -> LineSettings {
        self.default.with_timeout(self.timeout)
    }
}

/// Run the sweep and stop at the first device that answers.
pub async fn detect<C: Connector>(connector: &C, plan: &SweepPlan) -> Option<Detection> {
    let settings = plan.default_settings();
    tracing::info!(
        "Trying factory settings first ({}, id {:?})",
        settings,
        plan.default_ids
    );
    if let Some((device_id, registers)) =
        try_connection(connector, &settings, &plan.default_ids, plan).await
    {
        return Some(Detection {
            settings,
            device_id,
            phase: Phase::Default,
            registers,
        });
    }

    tracing::info!("Factory settings not responding, expanding scan");
    for settings in plan.combinations() {
        tracing::info!("Trying {}", settings);
        if let Some((device_id, registers)) =
            try_connection(connector, &settings, &plan.device_ids, plan).await
        {
            return Some(Detection {
                settings,
                device_id,
                phase: Phase::Sweep,
                registers,
            });
        }
    }

    None
}

async fn try_connection<C: Connector>(
    connector: &C,
    settings: &LineSettings,
    ids: &[u8],
    plan: &SweepPlan,
) -> Option<(u8, Vec<u16>)> {
    let mut transport = match connector.connect(settings).await {
        Ok(transport) => transport,
        Err(e) => {
            tracing::debug!("Cannot open line at {}: {}", settings, e);
            return None;
        }
    };

    for &device_id in ids {
        match transport
            .read_holding_registers(device_id, plan.probe_address, plan.probe_count)
            .await
        {
            Ok(registers) if !registers.is_empty() => return Some((device_id, registers)),
            Ok(_) => {}
            Err(e) => tracing::trace!("Device {} at {}: {}", device_id, settings, e),
        }
    }
    None
}
