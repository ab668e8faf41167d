//! Pulse-timer setup tests

mod common;

use common::bus;
use sercom_serial::pwm::{clock_divisor, STAGE7_ABOVE};
use sercom_serial::{ClockId, ConfigError, Pin, PinFunction, TimerId, Variant, MAX_PWM};

#[test]
fn test_divisor_thresholds() {
    assert_eq!(clock_divisor(381), 0);
    assert_eq!(clock_divisor(382), 1);
    assert_eq!(STAGE7_ABOVE, (64 + 256) * MAX_PWM / 2);
    assert_eq!(clock_divisor(STAGE7_ABOVE + 1), 7);
    assert_eq!(clock_divisor(1_000_000), 7);
}

#[test]
fn test_setup_programs_timer_and_routes_pin() {
    let bus = bus(Variant::Samd21);
    let pin = Pin::new('A', 18);

    let channel = bus.pwm_setup(pin, 1000).unwrap();
    assert_eq!(channel.timer, TimerId::Tcc(0));
    assert_eq!(channel.channel, 2);
    assert_eq!(channel.prescaler, 2);

    let mock = bus.target();
    assert_eq!(mock.timers(), vec![(TimerId::Tcc(0), 2, MAX_PWM)]);
    assert_eq!(mock.clocks(), vec![ClockId::Timer(TimerId::Tcc(0))]);
    assert_eq!(mock.routed(), vec![(pin, PinFunction::F)]);
}

#[test]
fn test_shared_timer_same_speed() {
    let bus = bus(Variant::Samd21);
    // PA04 and PA05 share TCC0
    bus.pwm_setup(Pin::new('A', 4), 500).unwrap();
    let second = bus.pwm_setup(Pin::new('A', 5), 600).unwrap();
    assert_eq!(second.channel, 1);

    // Programmed once, both pins routed
    assert_eq!(bus.target().timers().len(), 1);
    assert_eq!(bus.target().routed().len(), 2);
}

#[test]
fn test_shared_timer_different_speed_conflicts() {
    let bus = bus(Variant::Samd21);
    bus.pwm_setup(Pin::new('A', 4), 100).unwrap();
    assert_eq!(bus.pwm_setup(Pin::new('A', 5), 50_000), Err(ConfigError::PwmSpeedConflict));
    assert_eq!(bus.target().timers().len(), 1);
}

#[test]
fn test_samx5_tc_pins() {
    let bus = bus(Variant::Samx5);
    let channel = bus.pwm_setup(Pin::new('B', 8), 200).unwrap();
    assert_eq!(channel.timer, TimerId::Tc(4));
    assert_eq!(bus.target().timers(), vec![(TimerId::Tc(4), 0, MAX_PWM)]);
}

#[test]
fn test_invalid_pwm_pin() {
    let bus = bus(Variant::Samd21);
    let pin = Pin::new('B', 2);
    assert_eq!(bus.pwm_setup(pin, 1000), Err(ConfigError::InvalidPwmPin(pin)));
    assert_eq!(bus.target().hardware_writes(), 0);
}
