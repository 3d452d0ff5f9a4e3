use crate::error::{Result, VfdError};
use crate::line::LineSettings;
use std::future::Future;

/// Largest number of holding registers a single Modbus read may request.
pub const MAX_READ_REGISTERS: u16 = 125;

/// Holding-register access over any physical layer.
///
/// Implementations own framing and CRC; callers only deal in wire
/// (zero-based) addresses and 16-bit words.
pub trait Transport {
    /// Read `count` consecutive holding registers starting at `address`
    /// from the device answering to `device_id`.
    fn read_holding_registers(
        &mut self,
        device_id: u8,
        address: u16,
        count: u16,
    ) -> impl Future<Output = Result<Vec<u16>>> + Send;
}

/// Opens a fresh [`Transport`] for a given set of line parameters.
pub trait Connector {
    type Transport: Transport + Send;

    fn connect(
        &self,
        settings: &LineSettings,
    ) -> impl Future<Output = Result<Self::Transport>> + Send;
}

/// Reject reads the protocol cannot express.
pub fn check_read_range(address: u16, count: u16) -> Result<()> {
    if count == 0
        || count > MAX_READ_REGISTERS
        || u32::from(address) + u32::from(count) > u32::from(u16::MAX) + 1
    {
        return Err(VfdError::InvalidRange { address, count });
    }
    Ok(())
}

/// Ensure a response carries every requested word.
pub fn check_response_len(expected: u16, words: &[u16]) -> Result<()> {
    if words.len() < expected as usize {
        return Err(VfdError::ShortResponse {
            expected: expected as usize,
            actual: words.len(),
        });
    }
    Ok(())
}
