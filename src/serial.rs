//! Serial/RS-485 transport for Modbus RTU communication.
//!
//! This module provides a serial transport that implements the `Transport` trait,
//! using `tokio-modbus` for the underlying Modbus RTU communication.

use crate::error::{Result, VfdError};
use crate::line::LineSettings;
use crate::transport::{Connector, Transport, check_read_range, check_response_len};
use std::time::Duration;
use tokio_modbus::client::{Context, Reader};
use tokio_modbus::slave::{Slave, SlaveContext};
use tokio_serial::{DataBits, SerialPortBuilderExt};

/// Serial transport for Modbus RTU communication.
///
/// Wraps `tokio-modbus` to implement our `Transport` trait.
///
/// # Example
///
/// ```ignore
/// use fuji_vfd_rs::{LineSettings, SerialTransport, Transport};
///
/// let mut transport = SerialTransport::new("/dev/ttyUSB0", &LineSettings::default(), 9).await?;
/// let words = transport.read_holding_registers(9, 2120, 2).await?;
/// ```
pub struct SerialTransport {
    ctx: Context,
    slave_id: u8,
    timeout: Duration,
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("slave_id", &self.slave_id)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl SerialTransport {
    /// Open the serial port and attach an RTU client to it.
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyUSB0" or "COM4")
    /// * `settings` - Line parameters; data bits are always 8
    /// * `slave_id` - Initial Modbus device id
    pub async fn new(path: &str, settings: &LineSettings, slave_id: u8) -> Result<Self> {
        tracing::debug!("Opening {} ({})", path, settings);
        let port = tokio_serial::new(path, settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(settings.parity.into())
            .stop_bits(settings.stop_bits.into())
            .timeout(settings.timeout)
            .open_native_async()?;

        let ctx = tokio_modbus::client::rtu::attach_slave(port, Slave(slave_id));

        Ok(Self {
            ctx,
            slave_id,
            timeout: settings.timeout,
        })
    }

    /// Open with the Fuji factory line settings (9600 8E1).
    pub async fn open(path: &str, slave_id: u8) -> Result<Self> {
        Self::new(path, &LineSettings::default(), slave_id).await
    }

    /// Change the device id for subsequent requests.
    pub fn set_slave(&mut self, slave_id: u8) {
        self.slave_id = slave_id;
        self.ctx.set_slave(Slave(slave_id));
    }

    /// Get the current device id.
    pub fn slave_id(&self) -> u8 {
        self.slave_id
    }
}

impl Transport for SerialTransport {
    async fn read_holding_registers(
        &mut self,
        device_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>> {
        check_read_range(address, count)?;

        if device_id != self.slave_id {
            self.set_slave(device_id);
        }

        tracing::trace!(
            "Reading {} register(s) at {} from device {}",
            count,
            address,
            device_id
        );
        let timeout = self.timeout;
        let words = tokio::time::timeout(timeout, self.ctx.read_holding_registers(address, count))
            .await
            .map_err(|_| VfdError::Timeout(timeout))??;

        check_response_len(count, &words)?;
        Ok(words)
    }
}

/// Opens a [`SerialTransport`] on a fixed port path for whatever line
/// settings it is asked for.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    path: String,
    initial_slave: u8,
}

impl SerialConnector {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            initial_slave: 1,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Connector for SerialConnector {
    type Transport = SerialTransport;

    async fn connect(&self, settings: &LineSettings) -> Result<SerialTransport> {
        SerialTransport::new(&self.path, settings, self.initial_slave).await
    }
}
