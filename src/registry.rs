//! Resource registry.
//!
//! Owned per-instance runtime state, indexed by [`InstanceId`]: pin role
//! assignments, the programmed configuration, the TX/RX ring buffers and the
//! overrun fault. Everything is atomics so the SERCOM interrupt and the
//! foreground can share one registry without locks.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::config::{Variant, MAX_SERCOMS};
use crate::error::ConfigError;
use crate::fault::FaultState;
use crate::pins::{Pin, PinRole};
use crate::ring::RingBuffer;
use crate::target::ClockId;

const NO_PIN: u8 = 0xFF;

/// Validated SERCOM instance number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(u8);

impl InstanceId {
    /// Checked against the variant's instance count.
    pub fn new(instance: u8, variant: Variant) -> Result<Self, ConfigError> {
        if (instance as usize) < variant.instance_count() {
            Ok(Self(instance))
        } else {
            Err(ConfigError::InvalidBus(instance))
        }
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Core clock feeding this instance.
    #[inline]
    pub const fn clock(self) -> ClockId {
        ClockId::Sercom(self.0)
    }
}

/// Values a live instance was programmed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Programmed {
    /// Mode code, as stored by the configurator.
    pub mode: u8,
    pub rate: u32,
    /// Baud value in eighths.
    pub baud: u32,
}

/// State of one SERCOM instance.
pub struct InstanceState<'a> {
    pins: [AtomicU8; 3],
    live: AtomicBool,
    mode: AtomicU8,
    rate: AtomicU32,
    baud: AtomicU32,
    /// TX ring drain in progress (DRE interrupt owns the data register).
    pub(crate) tx_active: AtomicBool,
    /// RXC interrupt fills the RX ring.
    pub(crate) rx_irq: AtomicBool,
    pub tx: RingBuffer<'a>,
    pub rx: RingBuffer<'a>,
    pub fault: FaultState,
}

impl<'a> InstanceState<'a> {
    const INIT: Self = Self::new();

    pub const fn new() -> Self {
        Self {
            pins: [AtomicU8::new(NO_PIN), AtomicU8::new(NO_PIN), AtomicU8::new(NO_PIN)],
            live: AtomicBool::new(false),
            mode: AtomicU8::new(0),
            rate: AtomicU32::new(0),
            baud: AtomicU32::new(0),
            tx_active: AtomicBool::new(false),
            rx_irq: AtomicBool::new(false),
            tx: RingBuffer::new(),
            rx: RingBuffer::new(),
            fault: FaultState::new(),
        }
    }

    pub fn pin(&self, role: PinRole) -> Option<Pin> {
        match self.pins[role.index()].load(Ordering::Acquire) {
            NO_PIN => None,
            raw => Some(Pin::from_raw(raw)),
        }
    }

    pub(crate) fn set_pin(&self, role: PinRole, pin: Pin) {
        self.pins[role.index()].store(pin.raw(), Ordering::Release);
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Configuration of a live instance.
    pub fn programmed(&self) -> Option<Programmed> {
        if !self.is_live() {
            return None;
        }
        Some(Programmed {
            mode: self.mode.load(Ordering::Relaxed),
            rate: self.rate.load(Ordering::Relaxed),
            baud: self.baud.load(Ordering::Relaxed),
        })
    }

    /// Record the programmed configuration and mark the instance live.
    pub(crate) fn mark_live(&self, programmed: Programmed) {
        self.mode.store(programmed.mode, Ordering::Relaxed);
        self.rate.store(programmed.rate, Ordering::Relaxed);
        self.baud.store(programmed.baud, Ordering::Relaxed);
        self.live.store(true, Ordering::Release);
    }

    #[inline]
    pub fn tx_active(&self) -> bool {
        self.tx_active.load(Ordering::Acquire)
    }
}

impl Default for InstanceState<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-instance state for every SERCOM on the part.
pub struct Registry<'a> {
    instances: [InstanceState<'a>; MAX_SERCOMS],
}

impl<'a> Registry<'a> {
    pub const fn new() -> Self {
        Self {
            instances: [InstanceState::INIT; MAX_SERCOMS],
        }
    }

    #[inline]
    pub fn get(&self, id: InstanceId) -> &InstanceState<'a> {
        &self.instances[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstanceState<'a>> {
        self.instances.iter()
    }
}

impl Default for Registry<'_> {
    fn default() -> Self {
        Self::new()
    }
}
