//! Two-wire bus controller abstractions
//!
//! Provides the register-level operations the transaction engine needs
//! from a bus master peripheral. Implementations are thin: every method
//! maps to one or two register writes on the target controller.

/// Transfer direction of a bus phase (the R/W bit of the address byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Master transmits, slave receives
    Write,
    /// Slave transmits, master receives
    Read,
}

impl Direction {
    /// Value of the R/W bit that follows the 7-bit address
    pub const fn rw_bit(self) -> u8 {
        match self {
            Direction::Write => 0,
            Direction::Read => 1,
        }
    }
}

/// Hardware event reported by the interrupt trampoline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    /// Programmed byte count reached (TC flag)
    TransferComplete,
    /// Slave did not acknowledge the address or a data byte
    Nack,
}

/// Raw timing register image
///
/// Field values are register encodings, not durations:
/// - `scl_delay` = setup ticks - 1
/// - `sda_delay` = hold ticks
/// - `scl_high` / `scl_low` = period ticks - 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Input clock divider minus one (4 bits)
    pub prescaler: u8,
    /// Data setup delay (4 bits)
    pub scl_delay: u8,
    /// Data hold delay (4 bits)
    pub sda_delay: u8,
    /// SCL high period (8 bits)
    pub scl_high: u8,
    /// SCL low period (8 bits)
    pub scl_low: u8,
}

impl Timing {
    /// Pack into the 32-bit timing register layout
    ///
    /// `PRESC[31:28] SCLDEL[23:20] SDADEL[19:16] SCLH[15:8] SCLL[7:0]`
    pub const fn bits(&self) -> u32 {
        (((self.prescaler & 0x0F) as u32) << 28)
            | (((self.scl_delay & 0x0F) as u32) << 20)
            | (((self.sda_delay & 0x0F) as u32) << 16)
            | ((self.scl_high as u32) << 8)
            | (self.scl_low as u32)
    }
}

/// Two-wire bus master peripheral
///
/// The engine owns the peripheral exclusively while a transaction is in
/// flight; the interrupt trampoline only reads status flags and reports
/// a [`BusEvent`], it never calls into this trait.
pub trait BusPeripheral {
    /// Write the timing register
    ///
    /// Only valid while the peripheral is disabled.
    fn apply_timing(&mut self, timing: Timing);

    /// Set the peripheral enable bit
    fn enable(&mut self);

    /// Clear the peripheral enable bit
    ///
    /// Clearing the enable bit also resets the controller's internal
    /// state machine, which is what the bus-reset sequence relies on.
    fn disable(&mut self);

    /// Check the peripheral enable bit
    fn is_enabled(&self) -> bool;

    /// Program slave address, direction and byte count for the next phase
    ///
    /// Implementations must leave automatic STOP-on-count disabled: the
    /// engine issues STOP explicitly so it can hold the bus for a
    /// repeated START.
    ///
    /// # Arguments
    /// * `address` - 7-bit slave address (not shifted)
    /// * `direction` - R/W bit for the address byte
    /// * `nbytes` - Programmed byte count for this phase
    fn set_transfer(&mut self, address: u8, direction: Direction, nbytes: u8);

    /// Generate a START (or repeated START if the bus is still held)
    fn start(&mut self);

    /// Generate a STOP and release the bus
    fn stop(&mut self);
}

/// Standard bus speeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SclSpeed {
    /// Standard mode (100 kHz)
    #[default]
    Standard,
    /// Fast mode (400 kHz)
    Fast,
    /// Fast mode plus (1 MHz)
    FastPlus,
}

impl SclSpeed {
    /// SCL frequency in Hz
    pub const fn hz(self) -> u32 {
        match self {
            SclSpeed::Standard => 100_000,
            SclSpeed::Fast => 400_000,
            SclSpeed::FastPlus => 1_000_000,
        }
    }
}
