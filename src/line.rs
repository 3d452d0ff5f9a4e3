//! Serial line parameters for the RS-485 link.

use crate::error::VfdError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Fuji factory baud rate (function code y04).
pub const DEFAULT_BAUD_RATE: u32 = 9600;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    None,
    Even,
    Odd,
}

impl Parity {
    pub const fn letter(self) -> char {
        match self {
            Parity::None => 'N',
            Parity::Even => 'E',
            Parity::Odd => 'O',
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Parity {
    type Err = VfdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "none" => Ok(Parity::None),
            "e" | "even" => Ok(Parity::Even),
            "o" | "odd" => Ok(Parity::Odd),
            other => Err(VfdError::InvalidArgument(format!(
                "unknown parity '{}' (expected N, E or O)",
                other
            ))),
        }
    }
}

impl From<Parity> for tokio_serial::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => tokio_serial::Parity::None,
            Parity::Even => tokio_serial::Parity::Even,
            Parity::Odd => tokio_serial::Parity::Odd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopBits {
    One,
    Two,
}

impl StopBits {
    pub const fn count(self) -> u8 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}

impl FromStr for StopBits {
    type Err = VfdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(StopBits::One),
            "2" => Ok(StopBits::Two),
            other => Err(VfdError::InvalidArgument(format!(
                "unsupported stop bits '{}' (expected 1 or 2)",
                other
            ))),
        }
    }
}

impl From<StopBits> for tokio_serial::StopBits {
    fn from(stop_bits: StopBits) -> Self {
        match stop_bits {
            StopBits::One => tokio_serial::StopBits::One,
            StopBits::Two => tokio_serial::StopBits::Two,
        }
    }
}

/// Line parameters for one connection attempt. Data bits are always 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baud_rate: u32,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// Upper bound for a single request/response exchange.
    pub timeout: Duration,
}

impl LineSettings {
    pub const fn new(baud_rate: u32, parity: Parity, stop_bits: StopBits) -> Self {
        Self {
            baud_rate,
            parity,
            stop_bits,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for LineSettings {
    fn default() -> Self {
        Self::new(DEFAULT_BAUD_RATE, Parity::Even, StopBits::One)
    }
}

impl fmt::Display for LineSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 8{}{}", self.baud_rate, self.parity, self.stop_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fuji_factory_setting() {
        let settings = LineSettings::default();
        assert_eq!(settings.baud_rate, 9600);
        assert_eq!(settings.parity, Parity::Even);
        assert_eq!(settings.stop_bits, StopBits::One);
        assert_eq!(settings.timeout, Duration::from_secs(1));
        assert_eq!(settings.to_string(), "9600 8E1");
    }

    #[test]
    fn test_parity_parsing() {
        assert_eq!("E".parse::<Parity>().unwrap(), Parity::Even);
        assert_eq!("n".parse::<Parity>().unwrap(), Parity::None);
        assert_eq!("Odd".parse::<Parity>().unwrap(), Parity::Odd);
        assert!("X".parse::<Parity>().is_err());
    }

    #[test]
    fn test_stop_bits_parsing() {
        assert_eq!("1".parse::<StopBits>().unwrap(), StopBits::One);
        assert_eq!("2".parse::<StopBits>().unwrap(), StopBits::Two);
        assert!("1.5".parse::<StopBits>().is_err());
    }

    #[test]
    fn test_display_with_other_settings() {
        let settings = LineSettings::new(19200, Parity::None, StopBits::Two);
        assert_eq!(settings.to_string(), "19200 8N2");
    }
}
