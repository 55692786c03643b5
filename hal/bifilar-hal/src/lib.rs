//! Bifilar Hardware Abstraction Layer
//!
//! This crate defines the register-level traits a chip-specific backend
//! implements so the transaction engine in `bifilar-core` can drive a
//! two-wire bus controller and its pair of DMA channels.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Device drivers (RTC, sensors, codecs)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  bifilar-core (TransactionEngine)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  bifilar-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  bus          │       │  DMA channel  │
//! │  peripheral   │       │  (Tx / Rx)    │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::BusPeripheral`] - START/STOP/address/byte-count control
//! - [`dma::DmaChannel`] - Memory <-> data register byte movement

#![no_std]
#![deny(unsafe_code)]

pub mod dma;
pub mod i2c;

// Re-export key traits at crate root for convenience
pub use dma::{DmaBuffer, DmaChannel, DmaDirection};
pub use i2c::{BusEvent, BusPeripheral, Direction, SclSpeed, Timing};
