//! Closed-loop velocity regulation: sample → PI step → actuate → observe.

use core::fmt::{self, Write};

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embedded_hal::pwm::SetDutyCycle;
use embedded_hal_async::delay::DelayNs;

use crate::actuator::Actuator;
use crate::config::{ConfigError, RegulatorConfig};
use crate::fixed::Fixed;
use crate::pi::PiController;
use crate::pulse::PulseCounter;
use crate::sampler::{SampleError, VelocitySampler};

/// Raised once to stop a running [`Regulator`]; interrupts the sampling wait.
pub type ShutdownSignal = Signal<CriticalSectionRawMutex, ()>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegulatorState {
    Running,
    Stopped,
}

/// Values reported after every applied cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Observation {
    pub measured: Fixed,
    pub output: Fixed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome {
    Applied(Observation),
    /// The window could not be trusted; controller and output were left alone.
    Skipped(SampleError),
    Stopped,
}

/// Diagnostic sink. Must not block; the loop calls it once per cycle.
pub trait Observer {
    fn observe(&mut self, outcome: &CycleOutcome);
}

pub struct NoopObserver;

impl Observer for NoopObserver {
    fn observe(&mut self, _outcome: &CycleOutcome) {}
}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn observe(&mut self, outcome: &CycleOutcome) {
        (**self).observe(outcome)
    }
}

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegulatorError<E> {
    /// The PWM peripheral refused a write.
    Actuator(E),
}

impl<E: fmt::Debug> fmt::Display for RegulatorError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuator(e) => write!(f, "actuator write failed: {:?}", e),
        }
    }
}

pub struct Regulator<'a, D, P, O> {
    sampler: VelocitySampler<'a, D>,
    controller: PiController,
    actuator: Actuator<P>,
    observer: O,
    shutdown: &'a ShutdownSignal,
    target: Fixed,
    state: RegulatorState,
}

impl<'a, D, P, O> Regulator<'a, D, P, O>
where
    D: DelayNs,
    P: SetDutyCycle,
    O: Observer,
{
    /// Validates `config` before anything can run.
    pub fn new(
        config: RegulatorConfig,
        pulses: &'a PulseCounter,
        delay: D,
        pwm: P,
        observer: O,
        shutdown: &'a ShutdownSignal,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        Ok(Self {
            sampler: VelocitySampler::new(pulses, delay, config.sample_interval_ms),
            controller: PiController::from_config(&config)?,
            actuator: Actuator::new(pwm),
            observer,
            shutdown,
            target: config.target_velocity,
            state: RegulatorState::Running,
        })
    }

    pub fn state(&self) -> RegulatorState {
        self.state
    }

    pub fn controller(&self) -> &PiController {
        &self.controller
    }

    /// Run one cycle. After a stop every further call returns
    /// [`CycleOutcome::Stopped`] without sampling.
    pub async fn cycle(&mut self) -> Result<CycleOutcome, RegulatorError<P::Error>> {
        if self.state == RegulatorState::Running && self.shutdown.signaled() {
            self.shutdown.reset();
            self.state = RegulatorState::Stopped;
        }
        if self.state == RegulatorState::Stopped {
            return Ok(CycleOutcome::Stopped);
        }

        let outcome = match select(self.sampler.sample(), self.shutdown.wait()).await {
            Either::Second(()) => {
                self.state = RegulatorState::Stopped;
                CycleOutcome::Stopped
            }
            Either::First(Err(e)) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("velocity window rejected: {}", e);
                CycleOutcome::Skipped(e)
            }
            Either::First(Ok(measured)) => {
                let output = self.controller.step(self.target, measured);
                self.actuator
                    .apply(output)
                    .map_err(RegulatorError::Actuator)?;
                CycleOutcome::Applied(Observation { measured, output })
            }
        };

        self.observer.observe(&outcome);
        Ok(outcome)
    }

    /// Regulate until the shutdown signal fires, then drive the output off.
    ///
    /// Starts a fresh session: the integrator is zeroed and a previously
    /// stopped regulator resumes.
    pub async fn run(&mut self) -> Result<(), RegulatorError<P::Error>> {
        self.controller.reset();
        self.state = RegulatorState::Running;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "regulating to {} pulses/s every {} ms",
            self.target.to_f32(),
            self.sampler.interval_ms()
        );

        while self.cycle().await? != CycleOutcome::Stopped {}

        self.actuator.halt().map_err(RegulatorError::Actuator)?;

        #[cfg(feature = "defmt")]
        defmt::info!("regulator stopped, output off");
        Ok(())
    }
}

/// `Measured: 98.50, Output: 30.00%`
pub fn diagnostic_line(obs: &Observation) -> heapless::String<64> {
    let mut line = heapless::String::new();
    // 64 bytes always fits two Q16.16 values at two decimals.
    let _ = write!(
        line,
        "Measured: {:.2}, Output: {:.2}%",
        obs.measured.to_f32(),
        obs.output.to_f32()
    );
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embassy_futures::block_on;

    struct NoWait;

    impl DelayNs for NoWait {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    struct Sink;

    impl embedded_hal::pwm::ErrorType for Sink {
        type Error = Infallible;
    }

    impl SetDutyCycle for Sink {
        fn max_duty_cycle(&self) -> u16 {
            10_000
        }

        fn set_duty_cycle(&mut self, _duty: u16) -> Result<(), Infallible> {
            Ok(())
        }
    }

    #[test]
    fn diagnostic_line_format() {
        let obs = Observation {
            measured: Fixed::from_f32(98.5),
            output: Fixed::from_int(30),
        };
        assert_eq!(diagnostic_line(&obs).as_str(), "Measured: 98.50, Output: 30.00%");

        let extreme = Observation {
            measured: Fixed::MIN,
            output: Fixed::MAX,
        };
        assert!(diagnostic_line(&extreme).starts_with("Measured: -32768.00"));
    }

    #[test]
    fn rejects_invalid_config_before_running() {
        let pulses = PulseCounter::new();
        let shutdown = ShutdownSignal::new();
        let config = RegulatorConfig {
            sample_interval_ms: 0,
            ..Default::default()
        };
        let res = Regulator::new(config, &pulses, NoWait, Sink, NoopObserver, &shutdown);
        assert!(matches!(res, Err(ConfigError::ZeroSampleInterval)));
    }

    #[test]
    fn pending_shutdown_stops_before_sampling() {
        let pulses = PulseCounter::new();
        let shutdown = ShutdownSignal::new();
        let mut reg = Regulator::new(
            RegulatorConfig::default(),
            &pulses,
            NoWait,
            Sink,
            NoopObserver,
            &shutdown,
        )
        .unwrap();

        shutdown.signal(());
        assert_eq!(block_on(reg.cycle()), Ok(CycleOutcome::Stopped));
        assert_eq!(reg.state(), RegulatorState::Stopped);
        assert_eq!(block_on(reg.cycle()), Ok(CycleOutcome::Stopped));
        assert_eq!(reg.controller().integral(), Fixed::ZERO);
    }
}
