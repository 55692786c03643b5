//! Transfer state machine
//!
//! Pure bookkeeping for the transaction in flight. The completion handler
//! drives it from interrupt context; the waiting caller reads the result.
//! Nothing in here touches hardware.

pub mod completion;
pub mod machine;

pub use completion::Completion;
pub use machine::{Phase, TransferState};
