//! Configuration types
//!
//! Bus timing and engine behavior settings, fixed at initialization.

pub mod engine;
pub mod timing;

pub use engine::*;
pub use timing::*;
