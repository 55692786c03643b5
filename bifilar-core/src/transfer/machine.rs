//! Transfer state definition
//!
//! Transitions:
//! - transmit: `Idle -> AwaitingWriteComplete -> Idle`
//! - read: `Idle -> AwaitingRestartComplete -> AwaitingReadComplete -> Idle`
//! - receive: `Idle -> AwaitingReadComplete -> Idle`

use bifilar_hal::{BusEvent, Direction};

use super::completion::Completion;
use crate::error::BusError;

/// Phase of the transaction in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// No transaction; initial and terminal state
    Idle,
    /// Final write phase running
    AwaitingWriteComplete,
    /// Command phase running, bus to be held for a repeated START
    AwaitingRestartComplete,
    /// Read phase running
    AwaitingReadComplete,
}

/// Shared transfer bookkeeping
///
/// Written by the completion handler, read by the waiting caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferState {
    phase: Phase,
    restart_requested: bool,
    direction: Direction,
    completion_flag: bool,
}

impl Default for TransferState {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferState {
    /// Idle state
    pub const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            restart_requested: false,
            direction: Direction::Write,
            completion_flag: false,
        }
    }

    /// Start a write phase
    ///
    /// With `hold_bus` the phase ends without STOP so a read can follow
    /// under a repeated START.
    pub fn begin_write(&mut self, hold_bus: bool) -> Result<(), BusError> {
        if self.phase != Phase::Idle {
            return Err(BusError::Sequence);
        }

        self.direction = Direction::Write;
        self.restart_requested = hold_bus;
        self.completion_flag = false;
        self.phase = if hold_bus {
            Phase::AwaitingRestartComplete
        } else {
            Phase::AwaitingWriteComplete
        };
        Ok(())
    }

    /// Start a read phase
    ///
    /// Valid from `Idle` (plain receive) or after the restart of a
    /// command phase has been consumed.
    pub fn begin_read(&mut self) -> Result<(), BusError> {
        let after_restart = self.phase == Phase::AwaitingRestartComplete && !self.restart_requested;
        if self.phase != Phase::Idle && !after_restart {
            return Err(BusError::Sequence);
        }

        self.direction = Direction::Read;
        self.restart_requested = false;
        self.completion_flag = false;
        self.phase = Phase::AwaitingReadComplete;
        Ok(())
    }

    /// Completion handler decision
    ///
    /// Called from interrupt context. The restart check comes first:
    /// the command phase of a read is a write, and must hold the bus
    /// rather than be treated as a finished write.
    ///
    /// Returns `None` for events that arrive while idle.
    pub fn complete(&mut self, event: BusEvent) -> Option<Completion> {
        if self.phase == Phase::Idle {
            return None;
        }

        self.completion_flag = true;

        let completion = match event {
            BusEvent::Nack => {
                self.restart_requested = false;
                Completion::Nack
            }
            BusEvent::TransferComplete if self.restart_requested => {
                self.restart_requested = false;
                Completion::HoldBus
            }
            BusEvent::TransferComplete => match self.direction {
                Direction::Write => Completion::WriteDone,
                Direction::Read => Completion::ReadDone,
            },
        };

        Some(completion)
    }

    /// Caller has observed the completion
    pub fn acknowledge(&mut self) {
        self.completion_flag = false;
    }

    /// STOP issued; return to idle
    pub fn finish(&mut self) {
        *self = Self::new();
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Direction of the current phase
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Check whether the bus will be held at the end of this phase
    pub fn restart_requested(&self) -> bool {
        self.restart_requested
    }

    /// Check whether a completion is waiting to be observed
    pub fn is_complete(&self) -> bool {
        self.completion_flag
    }

    /// Check for the idle state
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }
}
