use crate::error::{Result, VfdError};

/// How a user-supplied register number is to be read.
///
/// The drive manual numbers holding registers from 1 while the wire
/// protocol addresses them from 0, so "register 2098" in the manual is
/// wire address 2097.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Addressing {
    /// Zero-based, sent on the wire unchanged.
    #[default]
    Wire,
    /// One-based, as printed in the drive manual.
    Manual,
}

impl Addressing {
    pub fn to_wire(self, address: u16) -> Result<u16> {
        match self {
            Addressing::Wire => Ok(address),
            Addressing::Manual => address.checked_sub(1).ok_or_else(|| {
                VfdError::InvalidAddress("manual register numbers start at 1".to_string())
            }),
        }
    }

    pub fn from_wire(self, address: u16) -> u16 {
        match self {
            Addressing::Wire => address,
            Addressing::Manual => address.saturating_add(1),
        }
    }
}

/// Wire address of a register numbered from 1 in the drive manual.
///
/// There is no register 0 in the manual; it maps to wire address 0.
pub const fn manual(register: u16) -> u16 {
    register.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_addresses_shift_down() {
        assert_eq!(Addressing::Manual.to_wire(2098).unwrap(), 2097);
        assert_eq!(Addressing::Manual.from_wire(2097), 2098);
        assert_eq!(manual(2103), 2102);
    }

    #[test]
    fn test_wire_addresses_pass_through() {
        assert_eq!(Addressing::Wire.to_wire(0).unwrap(), 0);
        assert_eq!(Addressing::Wire.to_wire(2120).unwrap(), 2120);
    }

    #[test]
    fn test_manual_zero_does_not_underflow() {
        assert_eq!(manual(0), 0);
        assert_eq!(manual(1), 0);
    }

    #[test]
    fn test_manual_zero_is_rejected() {
        assert!(matches!(
            Addressing::Manual.to_wire(0),
            Err(VfdError::InvalidAddress(_))
        ));
    }
}
