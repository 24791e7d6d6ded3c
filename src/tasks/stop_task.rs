use embassy_executor::task;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::peripherals::PA0;
use embassy_time::{Duration, Timer};

use hall_velocity_regulator::ShutdownSignal;

const DEBOUNCE_MS: u64 = 20;

/// Stop button: raises the regulator's shutdown signal once on a real press.
#[task]
pub async fn stop_task(mut button: ExtiInput<'static, PA0>, shutdown: &'static ShutdownSignal) {
    loop {
        button.wait_for_falling_edge().await;
        Timer::after(Duration::from_millis(DEBOUNCE_MS)).await;
        if button.is_low() {
            defmt::warn!("stop button pressed");
            shutdown.signal(());
            return;
        }
    }
}
