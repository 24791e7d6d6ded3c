use std::cell::Cell;
use std::future::pending;

use embassy_futures::block_on;
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;

use hall_velocity_regulator::sensors::hcsr04::{Hcsr04, RangeError};
use hall_velocity_regulator::sensors::MicrosClock;

#[derive(Debug, PartialEq)]
struct PinFault;

impl embedded_hal::digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Default)]
struct Trig {
    levels: Vec<bool>,
    broken: bool,
}

impl ErrorType for Trig {
    type Error = PinFault;
}

impl OutputPin for Trig {
    fn set_low(&mut self) -> Result<(), PinFault> {
        self.levels.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        if self.broken {
            return Err(PinFault);
        }
        self.levels.push(true);
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum EchoBehaviour {
    /// High for this many microseconds, then low.
    Pulse(u64),
    NeverRises,
    NeverFalls,
}

struct Echo<'a> {
    now: &'a Cell<u64>,
    behaviour: EchoBehaviour,
}

impl ErrorType for Echo<'_> {
    type Error = PinFault;
}

impl Wait for Echo<'_> {
    async fn wait_for_high(&mut self) -> Result<(), PinFault> {
        match self.behaviour {
            EchoBehaviour::NeverRises => pending().await,
            _ => {
                self.now.set(self.now.get() + 250);
                Ok(())
            }
        }
    }

    async fn wait_for_low(&mut self) -> Result<(), PinFault> {
        match self.behaviour {
            EchoBehaviour::Pulse(width) => {
                self.now.set(self.now.get() + width);
                Ok(())
            }
            _ => pending().await,
        }
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), PinFault> {
        self.wait_for_high().await
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), PinFault> {
        self.wait_for_low().await
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), PinFault> {
        self.wait_for_high().await
    }
}

/// Every wait completes at once; the echo future is always polled first.
struct Immediate;

impl DelayNs for Immediate {
    async fn delay_ns(&mut self, _ns: u32) {}
}

struct Clock<'a>(&'a Cell<u64>);

impl MicrosClock for Clock<'_> {
    fn now_micros(&self) -> u64 {
        self.0.get()
    }
}

fn ping(behaviour: EchoBehaviour) -> (Result<f32, RangeError<PinFault>>, Vec<bool>) {
    let now = Cell::new(1_000);
    let echo = Echo {
        now: &now,
        behaviour,
    };
    let mut sensor = Hcsr04::new(Trig::default(), echo, Immediate, Clock(&now));
    let res = block_on(sensor.measure_distance());
    let (trig, _) = sensor.release();
    (res, trig.levels)
}

#[test]
fn echo_of_580_us_is_ten_centimetres() {
    let (res, trig) = ping(EchoBehaviour::Pulse(580));
    let cm = res.unwrap();
    assert!((cm - 10.0).abs() < 0.05, "{}", cm);
    // low, high (10 µs), low
    assert_eq!(trig, vec![false, true, false]);
}

#[test]
fn missing_echo_is_a_timeout_not_a_distance() {
    let (res, _) = ping(EchoBehaviour::NeverRises);
    assert_eq!(res, Err(RangeError::Timeout));
}

#[test]
fn stuck_echo_is_a_timeout() {
    let (res, _) = ping(EchoBehaviour::NeverFalls);
    assert_eq!(res, Err(RangeError::Timeout));
}

#[test]
fn trigger_fault_is_reported() {
    let now = Cell::new(0);
    let echo = Echo {
        now: &now,
        behaviour: EchoBehaviour::Pulse(580),
    };
    let trig = Trig {
        broken: true,
        ..Default::default()
    };
    let mut sensor = Hcsr04::new(trig, echo, Immediate, Clock(&now)).with_timeout_us(5_000);
    assert_eq!(
        block_on(sensor.measure_distance()),
        Err(RangeError::Pin(PinFault))
    );
}
