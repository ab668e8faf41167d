//! Pulse-timer setup.
//!
//! Maps a PWM-capable pin to its timer block and channel, picks the
//! prescaler stage from the requested cycle time and programs the timer
//! once. A timer already running at another prescaler is never silently
//! reprogrammed. Duty-cycle writes are not handled here.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::config::Variant;
use crate::error::ConfigError;
use crate::log_info;
use crate::pins::{Pin, PinFunction};
use crate::sercom::SercomBus;
use crate::target::{ClockId, SercomTarget, TimerId};

/// Timer period (full-scale duty value).
pub const MAX_PWM: u32 = 255;

/// Lowest cycle time of prescaler stages 1 to 6.
pub const DIVISOR_THRESHOLDS: [u32; 6] = [
    (1 + 2) * MAX_PWM / 2,
    (2 + 4) * MAX_PWM / 2,
    (4 + 8) * MAX_PWM / 2,
    (8 + 16) * MAX_PWM / 2,
    (16 + 64) * MAX_PWM / 2,
    (64 + 256) * MAX_PWM / 2,
];

/// Cycle times above this select the slowest stage.
pub const STAGE7_ABOVE: u32 = (64 + 256) * MAX_PWM / 2;

/// Prescaler stage (0-7) for a cycle time in clock ticks.
pub fn clock_divisor(cycle_time: u32) -> u8 {
    if cycle_time > STAGE7_ABOVE {
        return 7;
    }
    DIVISOR_THRESHOLDS.iter().take_while(|&&t| cycle_time >= t).count() as u8
}

/// One PWM-capable pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PwmPin {
    pub pin: Pin,
    pub function: PinFunction,
    pub timer: TimerId,
    pub channel: u8,
}

const fn tcc(port: char, num: u8, function: PinFunction, timer: u8, channel: u8) -> PwmPin {
    PwmPin {
        pin: Pin::new(port, num),
        function,
        timer: TimerId::Tcc(timer),
        channel,
    }
}

const fn tc(port: char, num: u8, function: PinFunction, timer: u8, channel: u8) -> PwmPin {
    PwmPin {
        pin: Pin::new(port, num),
        function,
        timer: TimerId::Tc(timer),
        channel,
    }
}

use PinFunction::{E, F, G};

static SAMD21_PWM: &[PwmPin] = &[
    tcc('A', 4, E, 0, 0),
    tcc('A', 5, E, 0, 1),
    tcc('A', 6, E, 1, 0),
    tcc('A', 7, E, 1, 1),
    tcc('A', 8, E, 0, 0),
    tcc('A', 9, E, 0, 1),
    tcc('A', 10, E, 1, 0),
    tcc('A', 11, E, 1, 1),
    tcc('A', 12, E, 2, 0),
    tcc('A', 13, E, 2, 1),
    tcc('A', 16, E, 2, 0),
    tcc('A', 17, E, 2, 1),
    tcc('A', 18, F, 0, 2),
    tcc('A', 19, F, 0, 3),
    tcc('A', 24, F, 1, 2),
    tcc('A', 25, F, 1, 3),
    tcc('A', 30, E, 1, 0),
    tcc('A', 31, E, 1, 1),
    tcc('B', 30, E, 0, 0),
    tcc('B', 31, E, 0, 1),
];

static SAMX5_PWM: &[PwmPin] = &[
    tc('A', 4, E, 0, 0),
    tc('A', 6, E, 1, 0),
    tc('A', 12, E, 2, 0),
    // Shares TC2 with PA12
    tc('A', 13, E, 2, 1),
    tc('A', 14, E, 3, 0),
    tcc('A', 16, F, 1, 0),
    tcc('A', 17, F, 1, 1),
    tcc('A', 18, F, 1, 2),
    tcc('A', 19, F, 1, 3),
    tcc('A', 20, G, 0, 0),
    tcc('A', 21, G, 0, 1),
    tcc('A', 22, G, 0, 2),
    tcc('A', 23, G, 0, 3),
    tcc('B', 2, F, 2, 2),
    tc('B', 8, E, 4, 0),
    // Shares TC4 with PB08
    tc('B', 9, E, 4, 1),
    tcc('B', 12, F, 3, 0),
    tcc('B', 13, F, 3, 1),
    tcc('B', 14, F, 4, 0),
    tcc('B', 15, F, 4, 1),
    tcc('B', 16, G, 0, 4),
    tcc('B', 17, G, 0, 5),
];

pub fn pwm_table(variant: Variant) -> &'static [PwmPin] {
    match variant {
        Variant::Samd21 => SAMD21_PWM,
        Variant::Samx5 => SAMX5_PWM,
    }
}

pub fn lookup(variant: Variant, pin: Pin) -> Result<PwmPin, ConfigError> {
    pwm_table(variant)
        .iter()
        .find(|p| p.pin == pin)
        .copied()
        .ok_or(ConfigError::InvalidPwmPin(pin))
}

const TCC_COUNT: usize = 5;
const TC_COUNT: usize = 8;

/// Programmed prescaler per timer block, `0` while not running.
pub struct PulseTimers {
    slots: [AtomicU8; TCC_COUNT + TC_COUNT],
}

impl PulseTimers {
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicU8::new(0) }; TCC_COUNT + TC_COUNT],
        }
    }

    fn slot(timer: TimerId) -> usize {
        match timer {
            TimerId::Tcc(n) => n as usize,
            TimerId::Tc(n) => TCC_COUNT + n as usize,
        }
    }

    /// Prescaler of a running timer.
    pub fn prescaler(&self, timer: TimerId) -> Option<u8> {
        match self.slots[Self::slot(timer)].load(Ordering::Acquire) {
            0 => None,
            stage => Some(stage - 1),
        }
    }

    fn mark_running(&self, timer: TimerId, prescaler: u8) {
        self.slots[Self::slot(timer)].store(prescaler + 1, Ordering::Release);
    }
}

impl Default for PulseTimers {
    fn default() -> Self {
        Self::new()
    }
}

/// A routed PWM output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PwmChannel {
    pub pin: Pin,
    pub timer: TimerId,
    pub channel: u8,
    pub prescaler: u8,
}

impl<'a, T: SercomTarget> SercomBus<'a, T> {
    /// Start the timer behind `pin` for `cycle_time` ticks and route the pin.
    pub fn pwm_setup(&self, pin: Pin, cycle_time: u32) -> Result<PwmChannel, ConfigError> {
        self.try_pwm_setup(pin, cycle_time).map_err(|e| self.fail(e))
    }

    fn try_pwm_setup(&self, pin: Pin, cycle_time: u32) -> Result<PwmChannel, ConfigError> {
        let p = lookup(self.variant(), pin)?;
        self.target().enable_clock(ClockId::Timer(p.timer));

        let prescaler = clock_divisor(cycle_time);
        match self.timers.prescaler(p.timer) {
            Some(running) if running == prescaler => {}
            Some(_) => return Err(ConfigError::PwmSpeedConflict),
            None => {
                self.target().program_timer(p.timer, prescaler, MAX_PWM);
                self.timers.mark_running(p.timer, prescaler);
                log_info!(
                    self.logs().foreground,
                    self.now(),
                    "{:?}: prescaler stage {} for {}",
                    p.timer,
                    prescaler,
                    pin
                );
            }
        }

        self.target().route_pin(pin, p.function);
        Ok(PwmChannel {
            pin,
            timer: p.timer,
            channel: p.channel,
            prescaler,
        })
    }
}
