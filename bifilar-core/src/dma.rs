//! Directional DMA channel binding
//!
//! Wraps a platform channel with the arming rules the engine relies on:
//! a channel is disabled before it is re-armed, so a stale memory address
//! can never race a new transfer.

use bifilar_hal::{DmaBuffer, DmaChannel, DmaDirection};

use crate::error::ArmError;

/// Largest transfer the 8-bit byte count register can express
pub const MAX_TRANSFER_LEN: usize = 255;

/// Channel arming state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// Disabled, no buffer loaded
    Idle,
    /// Buffer loaded, channel not yet enabled
    Armed,
    /// Moving bytes
    Enabled,
}

/// DMA channel bound to one direction of the bus data path
pub struct DmaChannelBinding<C> {
    channel: C,
    direction: DmaDirection,
    state: ChannelState,
}

impl<C: DmaChannel> DmaChannelBinding<C> {
    /// Bind a channel to the transmit data register
    pub fn tx(channel: C) -> Self {
        Self::new(channel, DmaDirection::Tx)
    }

    /// Bind a channel to the receive data register
    pub fn rx(channel: C) -> Self {
        Self::new(channel, DmaDirection::Rx)
    }

    fn new(channel: C, direction: DmaDirection) -> Self {
        Self {
            channel,
            direction,
            state: ChannelState::Idle,
        }
    }

    /// Load a buffer into the channel
    ///
    /// The caller must keep `buffer`'s memory untouched until
    /// [`disable`](Self::disable) has been called.
    pub fn arm(&mut self, buffer: DmaBuffer<'_>) -> Result<(), ArmError> {
        if self.state != ChannelState::Idle {
            return Err(ArmError::ChannelBusy);
        }
        if buffer.direction() != self.direction {
            return Err(ArmError::DirectionMismatch);
        }
        if buffer.is_empty() {
            return Err(ArmError::EmptyTransfer);
        }
        if buffer.len() > MAX_TRANSFER_LEN {
            return Err(ArmError::TooLong);
        }

        trace!("Arming {} channel for {} bytes", self.direction, buffer.len());
        self.channel.load(buffer);
        self.state = ChannelState::Armed;
        Ok(())
    }

    /// Start moving bytes
    pub fn enable(&mut self) {
        if self.state != ChannelState::Armed {
            warn!("Enable on unarmed {} channel ignored", self.direction);
            return;
        }

        self.channel.enable();
        self.state = ChannelState::Enabled;
    }

    /// Stop the channel and forget the loaded buffer
    ///
    /// Safe to call in any state.
    pub fn disable(&mut self) {
        self.channel.disable();
        self.state = ChannelState::Idle;
    }

    /// Current arming state
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Direction this channel is bound to
    pub fn direction(&self) -> DmaDirection {
        self.direction
    }

    /// Get access to the underlying channel
    pub fn channel(&self) -> &C {
        &self.channel
    }
}
