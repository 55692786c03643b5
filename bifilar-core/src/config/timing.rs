//! Bus clock timing
//!
//! Tick counts are expressed in periods of the prescaled input clock,
//! `t_presc = (prescaler + 1) / input_clock_hz`. All comparisons against
//! nanosecond minimums are done in exact integer arithmetic.

use bifilar_hal::Timing;

use crate::error::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Allowed deviation of the effective SCL frequency from the target
pub const SCL_TOLERANCE_PERCENT: u64 = 10;

/// Largest prescaler register value (4-bit field)
pub const MAX_PRESCALER: u8 = 15;
/// Setup delay range in ticks (SCLDEL + 1)
pub const MAX_SETUP_TICKS: u16 = 16;
/// Hold delay range in ticks (SDADEL)
pub const MAX_HOLD_TICKS: u16 = 15;
/// SCL high/low range in ticks (SCLH/SCLL + 1)
pub const MAX_SCL_TICKS: u16 = 256;

const NS_PER_S: u64 = 1_000_000_000;

/// Minimum timing requirements of the slowest device on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceTiming {
    /// Highest SCL frequency the device accepts
    pub max_scl_hz: u32,
    /// Data setup time before the SCL rising edge
    pub min_setup_ns: u32,
    /// Data hold time after the SCL falling edge
    pub min_hold_ns: u32,
    /// SCL high period
    pub min_scl_high_ns: u32,
    /// SCL low period
    pub min_scl_low_ns: u32,
}

impl DeviceTiming {
    /// Standard mode (100 kHz)
    pub const STANDARD_MODE: Self = Self {
        max_scl_hz: 100_000,
        min_setup_ns: 250,
        min_hold_ns: 0,
        min_scl_high_ns: 4_000,
        min_scl_low_ns: 4_700,
    };

    /// Fast mode (400 kHz)
    pub const FAST_MODE: Self = Self {
        max_scl_hz: 400_000,
        min_setup_ns: 100,
        min_hold_ns: 0,
        min_scl_high_ns: 600,
        min_scl_low_ns: 1_300,
    };

    /// Fast mode plus (1 MHz)
    pub const FAST_MODE_PLUS: Self = Self {
        max_scl_hz: 1_000_000,
        min_setup_ns: 50,
        min_hold_ns: 0,
        min_scl_high_ns: 260,
        min_scl_low_ns: 500,
    };

    /// TC74 temperature sensor (SMBus timing, 100 kHz max)
    pub const TC74: Self = Self {
        max_scl_hz: 100_000,
        min_setup_ns: 1_000,
        min_hold_ns: 1_250,
        min_scl_high_ns: 4_000,
        min_scl_low_ns: 4_700,
    };

    /// CS43L22 audio codec control port
    pub const CS43L22: Self = Self {
        max_scl_hz: 100_000,
        min_setup_ns: 250,
        min_hold_ns: 0,
        min_scl_high_ns: 4_000,
        min_scl_low_ns: 4_700,
    };

    /// TCS34725 color sensor
    pub const TCS34725: Self = Self::FAST_MODE;

    /// DS3231 real-time clock
    pub const DS3231: Self = Self::FAST_MODE;
}

impl Default for DeviceTiming {
    fn default() -> Self {
        Self::STANDARD_MODE
    }
}

/// Bus clock configuration
///
/// Created once at bus init and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BusClockConfig {
    /// Peripheral kernel clock
    pub input_clock_hz: u32,
    /// Requested SCL frequency
    pub target_scl_hz: u32,
    /// Input clock divider minus one (0-15)
    pub prescaler: u8,
    /// Data setup time in ticks (1-16)
    pub setup_ticks: u16,
    /// Data hold time in ticks (0-15)
    pub hold_ticks: u16,
    /// SCL high period in ticks (1-256)
    pub scl_high_ticks: u16,
    /// SCL low period in ticks (1-256)
    pub scl_low_ticks: u16,
    /// Timing limits the configuration must honor
    pub device: DeviceTiming,
}

impl BusClockConfig {
    /// Compute a configuration for the given clocks and device limits
    ///
    /// Prescalers are tried from finest to coarsest; the first candidate
    /// that passes [`validate`](Self::validate) wins.
    pub fn derive(
        input_clock_hz: u32,
        target_scl_hz: u32,
        device: DeviceTiming,
    ) -> Result<Self, ConfigError> {
        if input_clock_hz == 0 || target_scl_hz == 0 || target_scl_hz > device.max_scl_hz {
            return Err(ConfigError::TimingInfeasible);
        }

        for prescaler in 0..=MAX_PRESCALER {
            let Some(candidate) = Self::candidate(input_clock_hz, target_scl_hz, device, prescaler)
            else {
                continue;
            };

            if candidate.validate().is_ok() {
                debug!(
                    "Timing solved: presc={} high={} low={} -> {} Hz",
                    prescaler,
                    candidate.scl_high_ticks,
                    candidate.scl_low_ticks,
                    candidate.effective_scl_hz()
                );
                return Ok(candidate);
            }
        }

        Err(ConfigError::TimingInfeasible)
    }

    fn candidate(
        input_clock_hz: u32,
        target_scl_hz: u32,
        device: DeviceTiming,
        prescaler: u8,
    ) -> Option<Self> {
        let divider = prescaler as u64 + 1;
        let input = input_clock_hz as u64;
        let step = divider * target_scl_hz as u64;

        // SCL period in whole ticks, rounded to nearest
        let total = (input + step / 2) / step;

        let high_min = ticks_for_ns(device.min_scl_high_ns, input, divider).max(1);
        let low_min = ticks_for_ns(device.min_scl_low_ns, input, divider).max(1);
        let high = high_min.max(total / 2);
        let low = low_min.max(total.saturating_sub(high));

        let setup = ticks_for_ns(device.min_setup_ns, input, divider).max(1);
        let hold = ticks_for_ns(device.min_hold_ns, input, divider);

        if high > MAX_SCL_TICKS as u64
            || low > MAX_SCL_TICKS as u64
            || setup > MAX_SETUP_TICKS as u64
            || hold > MAX_HOLD_TICKS as u64
        {
            return None;
        }

        Some(Self {
            input_clock_hz,
            target_scl_hz,
            prescaler,
            setup_ticks: setup as u16,
            hold_ticks: hold as u16,
            scl_high_ticks: high as u16,
            scl_low_ticks: low as u16,
            device,
        })
    }

    /// Check field ranges, device minimums and frequency tolerance
    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_range = self.input_clock_hz > 0
            && self.target_scl_hz > 0
            && self.target_scl_hz <= self.device.max_scl_hz
            && self.prescaler <= MAX_PRESCALER
            && (1..=MAX_SETUP_TICKS).contains(&self.setup_ticks)
            && self.hold_ticks <= MAX_HOLD_TICKS
            && (1..=MAX_SCL_TICKS).contains(&self.scl_high_ticks)
            && (1..=MAX_SCL_TICKS).contains(&self.scl_low_ticks);
        if !in_range {
            return Err(ConfigError::TimingInfeasible);
        }

        let meets_device = self.meets_ns(self.setup_ticks, self.device.min_setup_ns)
            && self.meets_ns(self.hold_ticks, self.device.min_hold_ns)
            && self.meets_ns(self.scl_high_ticks, self.device.min_scl_high_ns)
            && self.meets_ns(self.scl_low_ticks, self.device.min_scl_low_ns);
        if !meets_device {
            return Err(ConfigError::TimingInfeasible);
        }

        // |input / period - target| <= tol * target, scaled by period
        let period = self.divider() * self.period_ticks();
        let target_scaled = self.target_scl_hz as u64 * period;
        let deviation = (self.input_clock_hz as u64).abs_diff(target_scaled);
        if deviation * 100 > target_scaled * SCL_TOLERANCE_PERCENT {
            return Err(ConfigError::TimingInfeasible);
        }

        Ok(())
    }

    /// SCL frequency actually produced by this configuration
    pub fn effective_scl_hz(&self) -> u32 {
        let period = self.divider() * self.period_ticks();
        if period == 0 {
            return 0;
        }
        (self.input_clock_hz as u64 / period) as u32
    }

    /// Register image for [`BusPeripheral::apply_timing`](bifilar_hal::BusPeripheral::apply_timing)
    ///
    /// Only meaningful for a configuration that passed `validate`.
    pub fn timing(&self) -> Timing {
        Timing {
            prescaler: self.prescaler,
            scl_delay: self.setup_ticks.saturating_sub(1) as u8,
            sda_delay: self.hold_ticks as u8,
            scl_high: self.scl_high_ticks.saturating_sub(1) as u8,
            scl_low: self.scl_low_ticks.saturating_sub(1) as u8,
        }
    }

    fn divider(&self) -> u64 {
        self.prescaler as u64 + 1
    }

    fn period_ticks(&self) -> u64 {
        self.scl_high_ticks as u64 + self.scl_low_ticks as u64
    }

    /// ticks * t_presc >= min_ns
    fn meets_ns(&self, ticks: u16, min_ns: u32) -> bool {
        ticks as u64 * self.divider() * NS_PER_S >= min_ns as u64 * self.input_clock_hz as u64
    }
}

/// Smallest tick count covering `ns` at `input / divider`
fn ticks_for_ns(ns: u32, input: u64, divider: u64) -> u64 {
    let numerator = ns as u64 * input;
    let denominator = NS_PER_S * divider;
    numerator.div_ceil(denominator)
}
