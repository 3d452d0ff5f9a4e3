//! In-memory stand-ins for a drive on the bus, used by unit tests.

use crate::error::{Result, VfdError};
use crate::line::LineSettings;
use crate::transport::{Connector, Transport, check_read_range};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A bus with any number of devices, each a sparse register map.
///
/// Unset registers of a present device read as zero. Devices that were
/// never configured do not answer and every read from them times out.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    devices: BTreeSet<u8>,
    registers: HashMap<(u8, u16), u16>,
    failures: HashSet<(u8, u16)>,
    requests: Vec<(u8, u16, u16)>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, device_id: u8) -> Self {
        self.devices.insert(device_id);
        self
    }

    pub fn with_register(mut self, device_id: u8, address: u16, value: u16) -> Self {
        self.devices.insert(device_id);
        self.registers.insert((device_id, address), value);
        self
    }

    pub fn with_registers(mut self, device_id: u8, start: u16, values: &[u16]) -> Self {
        self.devices.insert(device_id);
        for (i, &value) in values.iter().enumerate() {
            self.registers.insert((device_id, start + i as u16), value);
        }
        self
    }

    /// Reads touching this register are answered with an exception.
    pub fn with_failure(mut self, device_id: u8, address: u16) -> Self {
        self.devices.insert(device_id);
        self.failures.insert((device_id, address));
        self
    }

    pub fn requests(&self) -> &[(u8, u16, u16)] {
        &self.requests
    }
}

impl Transport for MockTransport {
    async fn read_holding_registers(
        &mut self,
        device_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>> {
        check_read_range(address, count)?;
        self.requests.push((device_id, address, count));

        if !self.devices.contains(&device_id) {
            return Err(VfdError::Timeout(Duration::from_millis(200)));
        }

        (address..=address + (count - 1))
            .map(|addr| {
                if self.failures.contains(&(device_id, addr)) {
                    Err(VfdError::Io(std::io::Error::other(format!(
                        "Illegal data address ({})",
                        addr
                    ))))
                } else {
                    Ok(self.registers.get(&(device_id, addr)).copied().unwrap_or(0))
                }
            })
            .collect()
    }
}

/// Hands out a [`MockTransport`] whose devices only answer when the line
/// settings match the ones the bus is really running at.
#[derive(Debug, Clone)]
pub struct MockConnector {
    live: LineSettings,
    bus: MockTransport,
    unavailable: bool,
    attempts: Arc<Mutex<Vec<LineSettings>>>,
}

impl MockConnector {
    pub fn new(live: LineSettings, bus: MockTransport) -> Self {
        Self {
            live,
            bus,
            unavailable: false,
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every open fails, as with a missing port.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn attempts(&self) -> Vec<LineSettings> {
        self.attempts.lock().unwrap().clone()
    }

    fn matches(&self, settings: &LineSettings) -> bool {
        settings.baud_rate == self.live.baud_rate
            && settings.parity == self.live.parity
            && settings.stop_bits == self.live.stop_bits
    }
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    async fn connect(&self, settings: &LineSettings) -> Result<MockTransport> {
        self.attempts.lock().unwrap().push(*settings);
        if self.unavailable {
            return Err(VfdError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such port",
            )));
        }
        if self.matches(settings) {
            Ok(self.bus.clone())
        } else {
            Ok(MockTransport::new())
        }
    }
}
