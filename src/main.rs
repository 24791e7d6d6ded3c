#![no_std]
#![no_main]

mod board;
mod pwm;
mod state;
mod tasks;
mod usb;

use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Timer};
use {defmt_rtt as _, panic_probe as _};

use hall_velocity_regulator::{PulseCounter, RegulatorConfig, ShutdownSignal};

use crate::board::Board;
use crate::state::Telemetry;

// ── Shared between the hall edge task and the control loop ───────────────────
static PULSES: PulseCounter = PulseCounter::new();
static SHUTDOWN: ShutdownSignal = ShutdownSignal::new();

// ── Edge executor ─────────────────────────────────────────────────────────────
//  Runs only hall_task, preempting thread mode so EXTI14 is re-armed as soon as
//  an edge is taken. UART4 is unused and lends its vector.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn UART4() {
    EXECUTOR_HIGH.on_interrupt()
}

// ── Inter-task channels ───────────────────────────────────────────────────────
//  Producers use try_send: a slow USB host loses lines, never control cycles.
pub const TELEMETRY_DEPTH: usize = 4;
static TELEMETRY_CHAN: Channel<CriticalSectionRawMutex, Telemetry, TELEMETRY_DEPTH> =
    Channel::new();

// ── Main ──────────────────────────────────────────────────────────────────────
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // 1. Configuration, rejected before any hardware moves
    let config = match RegulatorConfig::default().validate() {
        Ok(c) => c,
        Err(e) => {
            defmt::error!("invalid regulator configuration: {}", e);
            loop {
                Timer::after(Duration::from_secs(1)).await;
            }
        }
    };

    // 2. Clocks, pins, PWM carrier
    let board = Board::init(config.pwm_frequency_hz);
    let mut led = board.led;

    // 3. USB CDC-ACM for the diagnostic lines
    let (usb_dev, usb_serial) = usb::init(board.usb_otg, board.usb_dp, board.usb_dm);
    spawner.spawn(usb::usb_task(usb_dev)).unwrap();
    spawner
        .spawn(tasks::telemetry_task::telemetry_task(
            usb_serial,
            TELEMETRY_CHAN.receiver(),
        ))
        .unwrap();

    // 4. Edge producer first, so the first window already counts
    interrupt::UART4.set_priority(Priority::P6);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::UART4);
    high_spawner
        .spawn(tasks::hall_task::hall_task(board.hall, &PULSES))
        .unwrap();

    // 5. Control loop
    spawner
        .spawn(tasks::control_task::control_task(
            config,
            &PULSES,
            board.motor,
            TELEMETRY_CHAN.sender(),
            &SHUTDOWN,
        ))
        .unwrap();

    // 6. Collaborators
    spawner
        .spawn(tasks::stop_task::stop_task(board.stop_button, &SHUTDOWN))
        .unwrap();
    spawner
        .spawn(tasks::range_task::range_task(
            board.ranger_trig,
            board.ranger_echo,
            TELEMETRY_CHAN.sender(),
        ))
        .unwrap();

    defmt::info!(
        "regulator up: target {} pulses/s, {} ms window, {} Hz PWM",
        config.target_velocity.to_f32(),
        config.sample_interval_ms,
        config.pwm_frequency_hz
    );

    // 7. Heartbeat LED @ 1 Hz
    loop {
        led.toggle();
        Timer::after(Duration::from_millis(500)).await;
    }
}
