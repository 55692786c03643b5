//! One-shot bus timing configuration
//!
//! Tracks whether timing has been applied and the peripheral enabled, and
//! owns the bus-reset sequence used after a timeout.

use bifilar_hal::BusPeripheral;

use crate::config::BusClockConfig;
use crate::error::{BusError, ConfigError};

/// Bus configurator
///
/// Lifecycle: unconfigured -> configured (peripheral disabled) -> enabled.
#[derive(Debug, Default)]
pub struct BusConfigurator {
    config: Option<BusClockConfig>,
    enabled: bool,
}

impl BusConfigurator {
    /// Create an unconfigured configurator
    pub const fn new() -> Self {
        Self {
            config: None,
            enabled: false,
        }
    }

    /// Validate and apply bus timing
    ///
    /// Leaves the peripheral disabled, ready for [`enable`](Self::enable).
    /// A second call is rejected: timing is fixed for the life of the bus.
    pub fn configure<P: BusPeripheral>(
        &mut self,
        peripheral: &mut P,
        cfg: BusClockConfig,
    ) -> Result<(), ConfigError> {
        if self.config.is_some() {
            return Err(ConfigError::AlreadyConfigured);
        }

        cfg.validate()?;

        peripheral.disable();
        peripheral.apply_timing(cfg.timing());
        self.config = Some(cfg);

        info!(
            "Bus configured: {} Hz SCL from {} Hz",
            cfg.effective_scl_hz(),
            cfg.input_clock_hz
        );
        Ok(())
    }

    /// Enable the peripheral
    pub fn enable<P: BusPeripheral>(&mut self, peripheral: &mut P) -> Result<(), ConfigError> {
        if self.config.is_none() {
            return Err(ConfigError::NotConfigured);
        }

        peripheral.enable();
        self.enabled = true;
        Ok(())
    }

    /// Check that transactions may run
    pub fn ensure_ready(&self) -> Result<(), BusError> {
        if self.config.is_some() && self.enabled {
            Ok(())
        } else {
            Err(BusError::NotReady)
        }
    }

    /// Bus-reset sequence
    ///
    /// Toggling the enable bit resets the controller's internal state;
    /// timing is re-applied while disabled. A no-op on an unconfigured bus.
    pub fn recover<P: BusPeripheral>(&mut self, peripheral: &mut P) {
        let Some(cfg) = self.config else {
            return;
        };

        warn!("Resetting bus");
        peripheral.disable();
        peripheral.apply_timing(cfg.timing());
        if self.enabled {
            peripheral.enable();
        }
    }

    /// Applied configuration, if any
    pub fn config(&self) -> Option<&BusClockConfig> {
        self.config.as_ref()
    }

    /// Check if the peripheral has been enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
