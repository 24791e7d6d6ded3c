//! Regulator configuration.
//!
//! Built once at startup, validated, then handed by value to the loop
//! constructors. Nothing here changes at runtime.

use core::fmt;

use crate::fixed::Fixed;
use crate::pi::IntegralBounds;
use crate::pulse::PulseCounter;
use crate::sampler::velocity_from_pulses;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    ZeroSampleInterval,
    InvertedIntegralBounds,
    ZeroPwmFrequency,
    /// `max_edge_rate_hz` is beyond what Q16.16 can hold as pulses/s.
    VelocityOutOfRange,
    /// One window at `max_edge_rate_hz` would saturate the pulse counter.
    CounterTooNarrow,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::ZeroSampleInterval => "sample interval must be nonzero",
            Self::InvertedIntegralBounds => "integral_min must not exceed integral_max",
            Self::ZeroPwmFrequency => "PWM carrier frequency must be nonzero",
            Self::VelocityOutOfRange => "maximum edge rate is not representable in Q16.16",
            Self::CounterTooNarrow => "pulse counter would saturate within one window",
        };
        f.write_str(msg)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegulatorConfig {
    /// Window over which edges are counted. Also the control period, so `ki`
    /// acts per sample, not per second.
    pub sample_interval_ms: u32,
    pub kp: Fixed,
    pub ki: Fixed,
    pub integral_min: Fixed,
    pub integral_max: Fixed,
    /// Setpoint in pulses per second.
    pub target_velocity: Fixed,
    pub pwm_frequency_hz: u32,
    /// Fastest edge rate the feedback line is expected to produce.
    pub max_edge_rate_hz: u32,
}

impl Default for RegulatorConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 100,
            kp: Fixed::from_bits(13_107),  // 0.2
            ki: Fixed::from_bits(6_553),   // 0.1
            integral_min: Fixed::from_int(-100),
            integral_max: Fixed::from_int(100),
            target_velocity: Fixed::from_int(100),
            pwm_frequency_hz: 1_000,
            max_edge_rate_hz: 10_000,
        }
    }
}

impl RegulatorConfig {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::ZeroSampleInterval);
        }
        if self.pwm_frequency_hz == 0 {
            return Err(ConfigError::ZeroPwmFrequency);
        }
        self.integral_bounds()?;

        let worst_window = self.max_edge_rate_hz as u64 * self.sample_interval_ms as u64 / 1_000;
        if worst_window >= PulseCounter::LIMIT as u64 {
            return Err(ConfigError::CounterTooNarrow);
        }
        // Per-window rounding can read one pulse above the nominal rate.
        if velocity_from_pulses(worst_window as u32 + 1, self.sample_interval_ms).is_none() {
            return Err(ConfigError::VelocityOutOfRange);
        }

        Ok(self)
    }

    pub fn integral_bounds(&self) -> Result<IntegralBounds, ConfigError> {
        IntegralBounds::new(self.integral_min, self.integral_max)
    }
}
