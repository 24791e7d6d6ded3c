//! Percent → PWM duty-cycle output.
//!
//! This is the only place the control path leaves fixed point.

use embedded_hal::pwm::SetDutyCycle;

use crate::fixed::Fixed;

pub struct Actuator<P> {
    pwm: P,
}

impl<P: SetDutyCycle> Actuator<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm }
    }

    /// Map `percent` onto `0..=max_duty_cycle()` and write it.
    ///
    /// Values outside `[0, 100]` are clamped, never rejected. Returns the duty
    /// that was written.
    pub fn apply(&mut self, percent: Fixed) -> Result<u16, P::Error> {
        let duty = duty_for_percent(percent.to_f32(), self.pwm.max_duty_cycle());
        self.pwm.set_duty_cycle(duty)?;
        Ok(duty)
    }

    /// Drive the output fully off.
    pub fn halt(&mut self) -> Result<(), P::Error> {
        self.pwm.set_duty_cycle_fully_off()
    }

    pub fn release(self) -> P {
        self.pwm
    }
}

/// Linear, truncating map of `[0.0, 100.0]` onto `[0, max_duty]`.
pub fn duty_for_percent(percent: f32, max_duty: u16) -> u16 {
    // NaN falls through clamp unchanged and then casts to zero.
    let percent = percent.clamp(0.0, 100.0);
    (percent / 100.0 * max_duty as f32) as u16
}
