//! Completion outcomes
//!
//! What the completion handler decided for the phase that just ended.
//! The waiting caller turns it into hardware actions on the peripheral
//! it owns.

/// Outcome of a finished bus phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Completion {
    /// Write phase done with a restart pending: keep the bus, no STOP
    HoldBus,
    /// Final write done: STOP, disable Tx DMA
    WriteDone,
    /// Final read done: STOP, disable Rx DMA
    ReadDone,
    /// Slave declined: STOP, disable both DMA channels
    Nack,
}

impl Completion {
    /// Check whether the caller must issue STOP
    pub fn issues_stop(self) -> bool {
        !matches!(self, Completion::HoldBus)
    }
}
