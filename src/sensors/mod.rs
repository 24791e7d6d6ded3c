pub mod hcsr04;

/// Monotonic microsecond timestamp source for pulse-width measurement.
pub trait MicrosClock {
    fn now_micros(&self) -> u64;
}
