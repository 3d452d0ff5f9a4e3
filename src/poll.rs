use crate::channel::{Channel, Measurement, read_channels};
use crate::transport::Transport;
use chrono::{DateTime, Local};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct Sample {
    pub timestamp: DateTime<Local>,
    pub device_id: u8,
    pub measurements: Vec<Measurement>,
}

/// Reads a fixed set of channels from one device on a fixed interval.
pub struct Poller<'a, T> {
    transport: &'a mut T,
    device_id: u8,
    channels: Vec<Channel>,
    interval: Duration,
}

impl<'a, T: Transport> Poller<'a, T> {
    pub fn new(transport: &'a mut T, device_id: u8, channels: Vec<Channel>) -> Self {
        Self {
            transport,
            device_id,
            channels,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Poll until `cancel` fires, handing each good sample to `sink`.
    ///
    /// Failed reads are logged and skipped. Returns the number of samples
    /// delivered.
    pub async fn run<F>(&mut self, cancel: CancellationToken, mut sink: F) -> usize
    where
        F: FnMut(&Sample),
    {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut delivered = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Poller stopping");
                    return delivered;
                }
                _ = interval.tick() => {}
            }

            tracing::trace!("Polling device {}...", self.device_id);
            match read_channels(&mut *self.transport, self.device_id, &self.channels).await {
                Ok(measurements) => {
                    let sample = Sample {
                        timestamp: Local::now(),
                        device_id: self.device_id,
                        measurements,
                    };
                    sink(&sample);
                    delivered += 1;
                }
                Err(e) => {
                    tracing::warn!("Modbus read error on device {}: {}", self.device_id, e);
                }
            }
        }
    }
}
