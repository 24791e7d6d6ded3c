use embassy_executor::task;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::Delay;

use hall_velocity_regulator::regulator::Regulator;
use hall_velocity_regulator::{CycleOutcome, Observer, PulseCounter, RegulatorConfig, ShutdownSignal};

use crate::pwm::MotorPwm;
use crate::state::Telemetry;
use crate::TELEMETRY_DEPTH;

pub type TelemetrySender = Sender<'static, CriticalSectionRawMutex, Telemetry, TELEMETRY_DEPTH>;

/// Forwards each cycle to the telemetry task. A full channel drops the line;
/// the loop never waits on USB.
struct ChannelObserver {
    tx: TelemetrySender,
}

impl Observer for ChannelObserver {
    fn observe(&mut self, outcome: &CycleOutcome) {
        let msg = match *outcome {
            CycleOutcome::Applied(obs) => Telemetry::Cycle(obs),
            CycleOutcome::Skipped(e) => Telemetry::Skipped(e),
            CycleOutcome::Stopped => return,
        };
        let _ = self.tx.try_send(msg);
    }
}

// ── Task ─────────────────────────────────────────────────────────────────────

#[task]
pub async fn control_task(
    config: RegulatorConfig,
    pulses: &'static PulseCounter,
    motor: MotorPwm,
    telemetry_tx: TelemetrySender,
    shutdown: &'static ShutdownSignal,
) {
    let observer = ChannelObserver { tx: telemetry_tx };
    let mut regulator = match Regulator::new(config, pulses, Delay, motor, observer, shutdown) {
        Ok(r) => r,
        Err(e) => {
            defmt::error!("regulator not started: {}", e);
            return;
        }
    };

    // Runs until the stop button fires; without it, until power-off.
    if let Err(e) = regulator.run().await {
        defmt::error!("regulator halted: {}", defmt::Display2Format(&e));
    }
}
