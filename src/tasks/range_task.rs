use embassy_executor::task;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{AnyPin, Output};
use embassy_stm32::peripherals::PC7;
use embassy_time::{Delay, Duration, Instant, Ticker};

use hall_velocity_regulator::sensors::hcsr04::{Hcsr04, RangeError};
use hall_velocity_regulator::sensors::MicrosClock;

use crate::state::Telemetry;
use crate::tasks::control_task::TelemetrySender;

struct EmbassyClock;

impl MicrosClock for EmbassyClock {
    fn now_micros(&self) -> u64 {
        Instant::now().as_micros()
    }
}

/// Ultrasonic ranger: one ping per second, independent of the control loop.
#[task]
pub async fn range_task(
    trig: Output<'static, AnyPin>,
    echo: ExtiInput<'static, PC7>,
    telemetry_tx: TelemetrySender,
) {
    let mut ranger = Hcsr04::new(trig, echo, Delay, EmbassyClock);
    let mut ticker = Ticker::every(Duration::from_secs(1));

    loop {
        ticker.next().await;

        let reading = match ranger.measure_distance().await {
            Ok(cm) => Some(cm),
            Err(RangeError::Timeout) => None,
            Err(RangeError::Pin(never)) => match never {},
        };
        let _ = telemetry_tx.try_send(Telemetry::Range(reading));
    }
}
