//! Interrupt dispatcher.
//!
//! All SERCOM vectors funnel into one entry point; each instance has a slot
//! naming which driver services it. An unassigned slot makes the interrupt
//! a no-op. Binding and clearing are idempotent.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::config::MAX_SERCOMS;
use crate::registry::InstanceId;

/// Driver servicing an instance's interrupt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum InterruptHandler {
    Unassigned = 0,
    Usart = 1,
}

impl InterruptHandler {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => InterruptHandler::Usart,
            _ => InterruptHandler::Unassigned,
        }
    }
}

/// Handler slots, one per instance.
pub struct Dispatcher {
    slots: [AtomicU8; MAX_SERCOMS],
}

impl Dispatcher {
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicU8::new(InterruptHandler::Unassigned as u8) }; MAX_SERCOMS],
        }
    }

    pub fn bind(&self, id: InstanceId, handler: InterruptHandler) {
        self.slots[id.index()].store(handler as u8, Ordering::Release);
    }

    pub fn clear(&self, id: InstanceId) {
        self.bind(id, InterruptHandler::Unassigned);
    }

    #[inline]
    pub fn handler(&self, id: InstanceId) -> InterruptHandler {
        InterruptHandler::from_u8(self.slots[id.index()].load(Ordering::Acquire))
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
