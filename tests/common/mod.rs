//! Simulated SERCOM target shared by the integration tests.
//!
//! Registers are modelled at the level the bus sees them: interrupt flags,
//! interrupt enables and a data register per instance. The transmit side
//! always has room unless a test holds DRE low; received bytes queue until
//! read. With loopback on, every transmitted byte is received again.
//!
//! `relax()` plays the part of the interrupt line: each spin-wait iteration
//! runs `on_interrupt` for every instance with an enabled flag pending, so
//! foreground loops are preempted deterministically on one thread.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};

use sercom_serial::{
    BusConfig, ClockId, ConfigError, InstanceId, IntFlags, Pin, PinFunction, PinRole, SercomBus, SercomTarget,
    TimerId, UsartFrame, Variant, MAX_SERCOMS,
};

pub const CLOCK_HZ: u32 = 48_000_000;

pub type MockBus = SercomBus<'static, MockSercom>;

struct MockState {
    routed: Vec<(Pin, PinFunction)>,
    clocks: Vec<ClockId>,
    programmed: Vec<(u8, UsartFrame)>,
    timers: Vec<(TimerId, u8, u32)>,
    enabled: [IntFlags; MAX_SERCOMS],
    dre_ready: [bool; MAX_SERCOMS],
    tx_wire: [Vec<u8>; MAX_SERCOMS],
    rx_line: [VecDeque<u8>; MAX_SERCOMS],
    loopback: bool,
    hardware_writes: usize,
    clock_hz: u32,
    now_us: i64,
}

pub struct MockSercom {
    state: Mutex<MockState>,
    bus: Weak<MockBus>,
    auto_irq: Cell<bool>,
    in_isr: Cell<bool>,
}

impl MockSercom {
    pub fn new(bus: Weak<MockBus>) -> Self {
        Self {
            state: Mutex::new(MockState {
                routed: Vec::new(),
                clocks: Vec::new(),
                programmed: Vec::new(),
                timers: Vec::new(),
                enabled: [IntFlags::empty(); MAX_SERCOMS],
                dre_ready: [true; MAX_SERCOMS],
                tx_wire: Default::default(),
                rx_line: Default::default(),
                loopback: false,
                hardware_writes: 0,
                clock_hz: CLOCK_HZ,
                now_us: 0,
            }),
            bus,
            auto_irq: Cell::new(true),
            in_isr: Cell::new(false),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    /// Echo transmitted bytes back into the receiver.
    pub fn set_loopback(&self, on: bool) {
        self.with(|s| s.loopback = on);
    }

    /// Stop `relax()` from raising interrupts.
    pub fn set_auto_irq(&self, on: bool) {
        self.auto_irq.set(on);
    }

    /// Hold the data-register-empty flag of `instance`.
    pub fn set_dre(&self, instance: u8, ready: bool) {
        self.with(|s| s.dre_ready[instance as usize] = ready);
    }

    pub fn set_clock_hz(&self, hz: u32) {
        self.with(|s| s.clock_hz = hz);
    }

    /// Bytes arriving on the RX line of `instance`.
    pub fn inject_rx(&self, instance: u8, bytes: &[u8]) {
        self.with(|s| s.rx_line[instance as usize].extend(bytes.iter().copied()));
    }

    pub fn rx_pending(&self, instance: u8) -> usize {
        self.with(|s| s.rx_line[instance as usize].len())
    }

    /// Everything written to the data register of `instance`.
    pub fn tx_wire(&self, instance: u8) -> Vec<u8> {
        self.with(|s| s.tx_wire[instance as usize].clone())
    }

    pub fn routed(&self) -> Vec<(Pin, PinFunction)> {
        self.with(|s| s.routed.clone())
    }

    pub fn clocks(&self) -> Vec<ClockId> {
        self.with(|s| s.clocks.clone())
    }

    pub fn programmed(&self) -> Vec<(u8, UsartFrame)> {
        self.with(|s| s.programmed.clone())
    }

    pub fn timers(&self) -> Vec<(TimerId, u8, u32)> {
        self.with(|s| s.timers.clone())
    }

    pub fn enabled_interrupts(&self, instance: u8) -> IntFlags {
        self.with(|s| s.enabled[instance as usize])
    }

    /// Count of configuration side effects (routing, clocks, programming).
    pub fn hardware_writes(&self) -> usize {
        self.with(|s| s.hardware_writes)
    }

    fn flags_of(s: &MockState, instance: usize) -> IntFlags {
        let mut flags = IntFlags::empty();
        if s.dre_ready[instance] {
            flags |= IntFlags::DRE | IntFlags::TXC;
        }
        if !s.rx_line[instance].is_empty() {
            flags |= IntFlags::RXC;
        }
        flags
    }

    /// Raise the interrupt for every instance with an enabled flag pending.
    pub fn fire_pending(&self) {
        if self.in_isr.get() {
            return;
        }
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        let pending: Vec<u8> = self.with(|s| {
            (0..MAX_SERCOMS)
                .filter(|&i| s.enabled[i].intersects(Self::flags_of(s, i)))
                .map(|i| i as u8)
                .collect()
        });
        self.in_isr.set(true);
        for instance in pending {
            bus.on_interrupt(instance);
        }
        self.in_isr.set(false);
    }
}

impl SercomTarget for MockSercom {
    fn enable_clock(&self, clock: ClockId) {
        self.with(|s| {
            s.hardware_writes += 1;
            if !s.clocks.contains(&clock) {
                s.clocks.push(clock);
            }
        });
    }

    fn clock_frequency(&self, _clock: ClockId) -> u32 {
        self.with(|s| s.clock_hz)
    }

    fn route_pin(&self, pin: Pin, function: PinFunction) {
        self.with(|s| {
            s.hardware_writes += 1;
            s.routed.push((pin, function));
        });
    }

    fn program_usart(&self, instance: InstanceId, frame: &UsartFrame) {
        self.with(|s| {
            s.hardware_writes += 1;
            s.programmed.push((instance.raw(), *frame));
        });
    }

    fn interrupt_flags(&self, instance: InstanceId) -> IntFlags {
        self.with(|s| Self::flags_of(s, instance.index()))
    }

    fn enable_interrupts(&self, instance: InstanceId, flags: IntFlags) {
        self.with(|s| s.enabled[instance.index()] |= flags);
    }

    fn disable_interrupts(&self, instance: InstanceId, flags: IntFlags) {
        self.with(|s| s.enabled[instance.index()] &= !flags);
    }

    fn write_data(&self, instance: InstanceId, byte: u8) {
        self.with(|s| {
            s.tx_wire[instance.index()].push(byte);
            if s.loopback {
                s.rx_line[instance.index()].push_back(byte);
            }
        });
    }

    fn read_data(&self, instance: InstanceId) -> u8 {
        self.with(|s| s.rx_line[instance.index()].pop_front().unwrap_or(0))
    }

    fn program_timer(&self, timer: TimerId, prescaler: u8, period: u32) {
        self.with(|s| {
            s.hardware_writes += 1;
            s.timers.push((timer, prescaler, period));
        });
    }

    fn now_us(&self) -> i64 {
        self.with(|s| {
            s.now_us += 1;
            s.now_us
        })
    }

    fn relax(&self) {
        if self.auto_irq.get() {
            self.fire_pending();
        }
    }

    fn shutdown(&self, reason: &ConfigError) -> ! {
        panic!("shutdown: {}", reason)
    }
}

pub fn bus_with(config: BusConfig) -> Arc<MockBus> {
    Arc::new_cyclic(|weak| SercomBus::new(MockSercom::new(weak.clone()), config))
}

pub fn bus(variant: Variant) -> Arc<MockBus> {
    bus_with(BusConfig::new(variant))
}

/// Storage that lives for the rest of the test process.
pub fn storage(len: usize) -> &'static mut [u8] {
    Box::leak(vec![0u8; len].into_boxed_slice())
}

pub fn assign(bus: &MockBus, instance: u8, tx: Pin, rx: Option<Pin>, clk: Option<Pin>) {
    bus.set_pin_role(instance, PinRole::Tx, tx).unwrap();
    if let Some(rx) = rx {
        bus.set_pin_role(instance, PinRole::Rx, rx).unwrap();
    }
    if let Some(clk) = clk {
        bus.set_pin_role(instance, PinRole::Clk, clk).unwrap();
    }
}

/// SAMD21 sercom0: TX PA08 (pad 0), RX PA10 (pad 2), CLK PA09 (pad 1).
pub fn assign_sercom0(bus: &MockBus) {
    assign(
        bus,
        0,
        Pin::new('A', 8),
        Some(Pin::new('A', 10)),
        Some(Pin::new('A', 9)),
    );
}

pub fn drain_log_text(bus: &MockBus) -> String {
    let mut out = String::new();
    sercom_serial::log_drain::drain_logs(bus.logs(), &mut out).unwrap();
    out
}
