//! Hall-sensor velocity regulator for a PWM-driven motor.
//!
//! Edges from a hall sensor are counted by an interrupt-side [`pulse::PulseCounter`];
//! the control loop turns each window's count into a Q16.16 velocity, runs a
//! fixed-point PI step and writes the result as a PWM duty cycle.
//!
//! Hardware access goes through `embedded-hal` traits so the whole loop runs
//! on the host under test. The STM32 firmware lives in `main.rs` behind the
//! `firmware` feature.

#![cfg_attr(not(test), no_std)]

pub mod actuator;
pub mod config;
pub mod fixed;
pub mod pi;
pub mod pulse;
pub mod regulator;
pub mod sampler;
pub mod sensors; // collaborators outside the control loop

pub use config::{ConfigError, RegulatorConfig};
pub use fixed::Fixed;
pub use pulse::PulseCounter;
pub use regulator::{CycleOutcome, Observation, Observer, Regulator, ShutdownSignal};
