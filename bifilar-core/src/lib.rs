//! Two-wire bus master transaction engine
//!
//! This crate contains the board-agnostic logic for driving a single-master,
//! 7-bit addressed two-wire bus through a DMA-capable peripheral:
//!
//! - Bus timing configuration (solver, validation, one-shot application)
//! - Directional DMA channel bindings
//! - Interrupt-to-task completion signalling
//! - The transfer state machine (write, repeated-START read)
//! - The transaction engine exposed to device drivers
//!
//! Hardware access goes through the traits in `bifilar-hal`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to every module
#[macro_use]
mod fmt;

pub mod address;
pub mod config;
pub mod configurator;
pub mod dma;
pub mod engine;
pub mod error;
pub mod signal;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use address::Address;
pub use config::{BusClockConfig, DeviceTiming, EngineConfig};
pub use configurator::BusConfigurator;
pub use dma::DmaChannelBinding;
pub use engine::TransactionEngine;
pub use error::{ArmError, BusError, ConfigError};
pub use signal::CompletionSignal;
pub use transfer::{Completion, Phase, TransferState};
