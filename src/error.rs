use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VfdError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    #[error("No response within {0:?}")]
    Timeout(Duration),

    #[error("Invalid register range: {count} word(s) at {address}")]
    InvalidRange { address: u16, count: u16 },

    #[error("Short response: expected {expected} word(s), got {actual}")]
    ShortResponse { expected: usize, actual: usize },

    #[error("Invalid register address: {0}")]
    InvalidAddress(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl VfdError {
    /// True when the device simply did not answer, as opposed to answering
    /// with an error or garbage.
    pub fn is_timeout(&self) -> bool {
        matches!(self, VfdError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, VfdError>;
