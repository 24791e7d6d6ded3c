//! Velocity estimation from hall pulses counted over a fixed window.

use core::fmt;

use embedded_hal_async::delay::DelayNs;

use crate::fixed::{Fixed, FRAC_BITS};
use crate::pulse::{CounterOverflow, PulseCounter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleError {
    /// The counter saturated; the window's count is meaningless.
    CounterOverflow,
    /// The count was valid but pulses/s does not fit in Q16.16.
    OutOfRange { pulses: u32 },
}

impl From<CounterOverflow> for SampleError {
    fn from(_: CounterOverflow) -> Self {
        Self::CounterOverflow
    }
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CounterOverflow => fmt::Display::fmt(&CounterOverflow, f),
            Self::OutOfRange { pulses } => {
                write!(f, "{} pulses exceed the representable velocity", pulses)
            }
        }
    }
}

/// `pulses / (interval_ms / 1000)` as Q16.16 pulses per second.
///
/// Integer arithmetic throughout, truncating toward zero. Returns `None` when
/// the result does not fit or `interval_ms` is zero.
pub fn velocity_from_pulses(pulses: u32, interval_ms: u32) -> Option<Fixed> {
    if interval_ms == 0 {
        return None;
    }
    // 32 + 16 + 10 bits, well inside u64.
    let raw = ((pulses as u64) << FRAC_BITS) * 1_000 / interval_ms as u64;
    i32::try_from(raw).ok().map(Fixed::from_bits)
}

/// Owns the control loop's only wait.
pub struct VelocitySampler<'a, D> {
    pulses: &'a PulseCounter,
    delay: D,
    interval_ms: u32,
}

impl<'a, D: DelayNs> VelocitySampler<'a, D> {
    /// `interval_ms` must be nonzero; [`crate::config::RegulatorConfig::validate`]
    /// guarantees it.
    pub fn new(pulses: &'a PulseCounter, delay: D, interval_ms: u32) -> Self {
        Self {
            pulses,
            delay,
            interval_ms,
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Open a window, suspend for `interval_ms`, and convert the edges seen
    /// inside it to pulses per second.
    ///
    /// Edges that arrived before the window opened are discarded.
    pub async fn sample(&mut self) -> Result<Fixed, SampleError> {
        let _ = self.pulses.read_and_clear();
        self.delay.delay_ms(self.interval_ms).await;

        let pulses = self.pulses.read_and_clear()?;
        velocity_from_pulses(pulses, self.interval_ms).ok_or(SampleError::OutOfRange { pulses })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use proptest::prelude::*;

    /// Delay that injects a burst of edges while "sleeping".
    struct EdgeDelay<'a> {
        pulses: &'a PulseCounter,
        edges_per_wait: u32,
        waited_ms: u32,
    }

    impl DelayNs for EdgeDelay<'_> {
        async fn delay_ns(&mut self, ns: u32) {
            self.waited_ms += ns / 1_000_000;
            for _ in 0..self.edges_per_wait {
                self.pulses.on_edge();
            }
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.waited_ms += ms;
            for _ in 0..self.edges_per_wait {
                self.pulses.on_edge();
            }
        }
    }

    #[test]
    fn converts_window_count_to_pulses_per_second() {
        assert_eq!(velocity_from_pulses(10, 100), Some(Fixed::from_int(100)));
        assert_eq!(velocity_from_pulses(0, 100), Some(Fixed::ZERO));
        assert_eq!(velocity_from_pulses(1, 3).map(Fixed::to_bits), Some(21_845_333));
        assert_eq!(velocity_from_pulses(5, 0), None);
        assert_eq!(velocity_from_pulses(3_277, 100), None);
    }

    #[test]
    fn sample_waits_one_interval_and_counts_inside_it() {
        let pulses = PulseCounter::new();
        // Stale edges from before the window must not be counted.
        for _ in 0..50 {
            pulses.on_edge();
        }

        let delay = EdgeDelay {
            pulses: &pulses,
            edges_per_wait: 12,
            waited_ms: 0,
        };
        let mut sampler = VelocitySampler::new(&pulses, delay, 100);

        let v = block_on(sampler.sample());
        assert_eq!(v, Ok(Fixed::from_int(120)));
        assert_eq!(sampler.delay.waited_ms, 100);
        assert_eq!(pulses.pending(), 0);
    }

    #[test]
    fn sample_reports_unrepresentable_velocity() {
        let pulses = PulseCounter::new();
        let delay = EdgeDelay {
            pulses: &pulses,
            edges_per_wait: 5_000,
            waited_ms: 0,
        };
        let mut sampler = VelocitySampler::new(&pulses, delay, 100);

        assert_eq!(
            block_on(sampler.sample()),
            Err(SampleError::OutOfRange { pulses: 5_000 })
        );
    }

    proptest! {
        #[test]
        fn conversion_matches_real_division(pulses in 0u32..3_000, interval_ms in 1u32..1_000) {
            let expected = pulses as f64 * 1_000.0 / interval_ms as f64;
            if let Some(v) = velocity_from_pulses(pulses, interval_ms) {
                let got = v.to_bits() as f64 / 65_536.0;
                prop_assert!(got <= expected && expected - got < 1.0 / 65_536.0);
            } else {
                prop_assert!(expected >= 32_768.0 - 1.0 / 65_536.0);
            }
        }
    }
}
