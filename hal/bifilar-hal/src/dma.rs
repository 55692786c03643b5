//! DMA channel abstractions
//!
//! A channel is pre-bound by the platform to one of the bus peripheral's
//! data registers (transmit or receive). The engine only supplies the
//! memory side of each transfer.

/// Which data register a channel is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaDirection {
    /// Memory -> transmit data register
    Tx,
    /// Receive data register -> memory
    Rx,
}

/// Memory side of a DMA transfer
///
/// The buffer is borrowed only for the duration of the `load` call; the
/// caller keeps the underlying memory alive and untouched until the
/// channel has been disabled again.
pub enum DmaBuffer<'a> {
    /// Bytes to send
    Tx(&'a [u8]),
    /// Bytes to fill
    Rx(&'a mut [u8]),
}

impl DmaBuffer<'_> {
    /// Direction implied by the buffer
    pub fn direction(&self) -> DmaDirection {
        match self {
            DmaBuffer::Tx(_) => DmaDirection::Tx,
            DmaBuffer::Rx(_) => DmaDirection::Rx,
        }
    }

    /// Number of bytes to move
    pub fn len(&self) -> usize {
        match self {
            DmaBuffer::Tx(buf) => buf.len(),
            DmaBuffer::Rx(buf) => buf.len(),
        }
    }

    /// Check for an empty transfer
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// DMA channel bound to a bus data register
pub trait DmaChannel {
    /// Program memory address and transfer count
    ///
    /// Only valid while the channel is disabled.
    fn load(&mut self, buffer: DmaBuffer<'_>);

    /// Set the channel enable bit
    fn enable(&mut self);

    /// Clear the channel enable bit
    fn disable(&mut self);
}
