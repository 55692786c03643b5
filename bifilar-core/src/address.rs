//! 7-bit slave addresses

use crate::error::BusError;

/// Validated 7-bit slave address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address(u8);

impl Address {
    /// Highest 7-bit address
    pub const MAX: u8 = 0x7F;

    /// Validate a raw address
    ///
    /// Only the range is enforced. Reserved addresses are accepted since
    /// some parts (and the general call) legitimately use them.
    pub fn new(raw: u8) -> Result<Self, BusError> {
        if raw > Self::MAX {
            return Err(BusError::InvalidAddress);
        }

        let address = Self(raw);
        if address.is_reserved() {
            warn!("Address {=u8:#x} is in a reserved range", raw);
        }
        Ok(address)
    }

    /// Raw 7-bit value
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Check for the reserved ranges 0x00-0x07 and 0x78-0x7F
    pub const fn is_reserved(self) -> bool {
        self.0 <= 0x07 || self.0 >= 0x78
    }
}

impl TryFrom<u8> for Address {
    type Error = BusError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}
