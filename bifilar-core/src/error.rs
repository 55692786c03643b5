//! Error types
//!
//! Configuration errors abort initialization. Transaction errors go back to
//! the calling driver, which owns the retry policy.

/// Bus configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Requested rate cannot be met with the input clock granularity
    /// and the device's minimum timings
    TimingInfeasible,
    /// Timing has already been applied
    AlreadyConfigured,
    /// `enable` called before `configure`
    NotConfigured,
    /// A transaction is in flight
    Busy,
}

/// DMA channel arming errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArmError {
    /// Zero-length transfer requested
    EmptyTransfer,
    /// Channel still armed from a previous transfer
    ChannelBusy,
    /// Buffer direction does not match the channel binding
    DirectionMismatch,
    /// Transfer exceeds the programmable byte count
    TooLong,
}

/// Per-transaction bus errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Engine used before `configure` + `enable`
    NotReady,
    /// Slave did not acknowledge
    Nack,
    /// No completion before the deadline; the bus has been reset
    Timeout,
    /// Address does not fit in 7 bits
    InvalidAddress,
    /// DMA channel could not be armed
    Dma(ArmError),
    /// Operation list the engine cannot express on the wire
    UnsupportedSequence,
    /// Completion did not match the phase in flight
    Sequence,
}

impl From<ArmError> for BusError {
    fn from(e: ArmError) -> Self {
        BusError::Dma(e)
    }
}

impl embedded_hal::i2c::Error for BusError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

        match self {
            BusError::Nack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            _ => ErrorKind::Other,
        }
    }
}
