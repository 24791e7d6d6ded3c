use embassy_executor::task;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::peripherals::PB14;

use hall_velocity_regulator::PulseCounter;

/// Edge producer. Woken by EXTI14 on every rising edge of the hall line.
///
/// Spawned on the interrupt executor: nothing on the thread executor may sit
/// between an edge and the re-arm of the line.
#[task]
pub async fn hall_task(mut hall: ExtiInput<'static, PB14>, pulses: &'static PulseCounter) {
    loop {
        hall.wait_for_rising_edge().await;
        pulses.on_edge();
    }
}
