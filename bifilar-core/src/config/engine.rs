//! Transaction engine settings

use embassy_time::Duration;

/// Default completion deadline (the SMBus clock-low timeout)
pub const DEFAULT_TIMEOUT_MS: u64 = 25;

/// Transaction engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// Longest wait for a single phase to complete before the engine
    /// forces STOP and resets the bus
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl EngineConfig {
    /// Configuration with a custom per-phase deadline
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}
