use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{AnyPin, Input, Level, Output, OutputType, Pin, Pull, Speed};
use embassy_stm32::peripherals::{PA0, PA11, PA12, PB14, PC7, USB_OTG_FS};
use embassy_stm32::rcc::*;
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::timer::{Channel, CountingMode};
use embassy_stm32::Config;

use crate::pwm::MotorPwm;

/// Everything the tasks need, already configured.
pub struct Board {
    /// Hall sensor, rising edges (PB14, EXTI14)
    pub hall: ExtiInput<'static, PB14>,
    /// Motor drive, TIM3_CH3 on PB0
    pub motor: MotorPwm,
    /// Stop button to ground (PA0)
    pub stop_button: ExtiInput<'static, PA0>,
    /// HC-SR04 trigger (PC6) and echo (PC7, EXTI7)
    pub ranger_trig: Output<'static, AnyPin>,
    pub ranger_echo: ExtiInput<'static, PC7>,
    pub led: Output<'static, AnyPin>,
    pub usb_otg: USB_OTG_FS,
    pub usb_dp: PA12,
    pub usb_dm: PA11,
}

impl Board {
    /// Clock tree, then pins. The PWM carrier is fixed here for the lifetime
    /// of the firmware.
    pub fn init(pwm_frequency_hz: u32) -> Self {
        let mut config = Config::default();
        config.rcc.hse = Some(Hse {
            freq: TimeHertz(8_000_000),
            mode: HseMode::Oscillator,
        });
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL168,
            divp: Some(PllPDiv::DIV2), // 168 MHz
            divq: Some(PllQDiv::DIV7), // 48 MHz USB
            divr: None,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;

        let p = embassy_stm32::init(config);

        let hall = ExtiInput::new(Input::new(p.PB14, Pull::Down), p.EXTI14);
        let stop_button = ExtiInput::new(Input::new(p.PA0, Pull::Up), p.EXTI0);
        let ranger_echo = ExtiInput::new(Input::new(p.PC7, Pull::None), p.EXTI7);
        let ranger_trig = Output::new(p.PC6.degrade(), Level::Low, Speed::Low);
        let led = Output::new(p.PC13.degrade(), Level::High, Speed::Low);

        let ch3 = PwmPin::new_ch3(p.PB0, OutputType::PushPull);
        let pwm = SimplePwm::new(
            p.TIM3,
            None,
            None,
            Some(ch3),
            None,
            TimeHertz(pwm_frequency_hz),
            CountingMode::EdgeAlignedUp,
        );
        let motor = MotorPwm::new(pwm, Channel::Ch3);

        Self {
            hall,
            motor,
            stop_button,
            ranger_trig,
            ranger_echo,
            led,
            usb_otg: p.USB_OTG_FS,
            usb_dp: p.PA12,
            usb_dm: p.PA11,
        }
    }
}
