//! Fixed-point PI controller.
//!
//! Works in `no_std`, never allocates, and is total: every input produces an
//! output in `[0, 100]`.

use crate::config::{ConfigError, RegulatorConfig};
use crate::fixed::Fixed;

pub const OUTPUT_MIN: Fixed = Fixed::ZERO;
pub const OUTPUT_MAX: Fixed = Fixed::from_int(100);

/// Anti-windup limits for the integrator. `min <= max` by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IntegralBounds {
    min: Fixed,
    max: Fixed,
}

impl IntegralBounds {
    pub fn new(min: Fixed, max: Fixed) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvertedIntegralBounds);
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Fixed {
        self.min
    }

    pub fn max(&self) -> Fixed {
        self.max
    }
}

pub struct PiController {
    /// Proportional gain
    kp: Fixed,
    /// Integral gain, applied once per sample
    ki: Fixed,
    bounds: IntegralBounds,

    /// Integrator state
    integral: Fixed,
}

impl PiController {
    pub fn new(kp: Fixed, ki: Fixed, bounds: IntegralBounds) -> Self {
        Self {
            kp,
            ki,
            bounds,
            integral: Fixed::ZERO,
        }
    }

    pub fn from_config(config: &RegulatorConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.kp, config.ki, config.integral_bounds()?))
    }

    /// Start a new control session.
    pub fn reset(&mut self) {
        self.integral = Fixed::ZERO;
    }

    pub fn integral(&self) -> Fixed {
        self.integral
    }

    /// One controller update. Returns the actuation percentage.
    pub fn step(&mut self, target: Fixed, measured: Fixed) -> Fixed {
        let error = target - measured;

        let p = self.kp * error;

        // Accumulate unconditionally, then pin. The integrator may re-enter the
        // band from the limit on the very next step.
        self.integral += self.ki * error;
        self.integral = self.integral.clamp(self.bounds.min, self.bounds.max);

        (p + self.integral).clamp(OUTPUT_MIN, OUTPUT_MAX)
    }
}
