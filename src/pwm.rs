use core::convert::Infallible;

use embassy_stm32::peripherals::TIM3;
use embassy_stm32::timer::simple_pwm::SimplePwm;
use embassy_stm32::timer::Channel;
use embedded_hal::pwm::{ErrorType, SetDutyCycle};

/// One channel of a `SimplePwm`, exposed through `embedded-hal`.
pub struct MotorPwm {
    pwm: SimplePwm<'static, TIM3>,
    channel: Channel,
}

impl MotorPwm {
    /// Starts with the output off.
    pub fn new(mut pwm: SimplePwm<'static, TIM3>, channel: Channel) -> Self {
        pwm.set_duty(channel, 0);
        pwm.enable(channel);
        Self { pwm, channel }
    }
}

impl ErrorType for MotorPwm {
    type Error = Infallible;
}

impl SetDutyCycle for MotorPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.pwm.get_max_duty()
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.pwm.set_duty(self.channel, duty);
        Ok(())
    }
}
