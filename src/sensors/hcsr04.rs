//! HC-SR04 style ultrasonic time-of-flight ranger.
//!
//! Trigger with a 10 µs pulse, time the echo's high phase, scale to
//! centimetres. A missing or endless echo is reported as
//! [`RangeError::Timeout`], never as a distance.

use core::fmt;

use embassy_futures::select::{select, Either};
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;

use super::MicrosClock;

/// Round-trip echo time per centimetre at ~343 m/s.
pub const US_PER_CM: f32 = 58.0;
/// Maximum wait for each echo edge, ~5 m of range.
pub const DEFAULT_TIMEOUT_US: u32 = 30_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangeError<E> {
    /// No echo edge within the timeout.
    Timeout,
    Pin(E),
}

impl<E: fmt::Debug> fmt::Display for RangeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("no echo within timeout"),
            Self::Pin(e) => write!(f, "pin error: {:?}", e),
        }
    }
}

/// Echo width to distance. 580 µs → 10 cm.
#[inline]
pub fn echo_to_cm(echo_us: u32) -> f32 {
    echo_us as f32 / US_PER_CM
}

pub struct Hcsr04<T, E, D, C> {
    trig: T,
    echo: E,
    delay: D,
    clock: C,
    timeout_us: u32,
}

impl<T, E, D, C, PinErr> Hcsr04<T, E, D, C>
where
    T: OutputPin<Error = PinErr>,
    E: Wait<Error = PinErr>,
    D: DelayNs,
    C: MicrosClock,
{
    pub fn new(trig: T, echo: E, delay: D, clock: C) -> Self {
        Self {
            trig,
            echo,
            delay,
            clock,
            timeout_us: DEFAULT_TIMEOUT_US,
        }
    }

    pub fn with_timeout_us(mut self, timeout_us: u32) -> Self {
        self.timeout_us = timeout_us;
        self
    }

    /// Fire one ping and return the distance in centimetres.
    pub async fn measure_distance(&mut self) -> Result<f32, RangeError<PinErr>> {
        self.trig.set_low().map_err(RangeError::Pin)?;
        self.delay.delay_us(2).await;
        self.trig.set_high().map_err(RangeError::Pin)?;
        self.delay.delay_us(10).await;
        self.trig.set_low().map_err(RangeError::Pin)?;

        match select(self.echo.wait_for_high(), self.delay.delay_us(self.timeout_us)).await {
            Either::First(res) => res.map_err(RangeError::Pin)?,
            Either::Second(()) => return Err(RangeError::Timeout),
        }
        let start = self.clock.now_micros();

        match select(self.echo.wait_for_low(), self.delay.delay_us(self.timeout_us)).await {
            Either::First(res) => res.map_err(RangeError::Pin)?,
            Either::Second(()) => return Err(RangeError::Timeout),
        }
        let width = self.clock.now_micros().saturating_sub(start);

        Ok(echo_to_cm(u32::try_from(width).unwrap_or(u32::MAX)))
    }

    pub fn release(self) -> (T, E) {
        (self.trig, self.echo)
    }
}
