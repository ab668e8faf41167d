//! Sticky receive-overrun state.
//!
//! Written from interrupt context when an incoming byte finds the RX ring
//! full. The byte is dropped, never blocked on. Foreground code polls the
//! state and clears it once handled; the drop counter survives clears.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Why a fault was raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault.
    None = 0,

    /// Received byte dropped: RX ring buffer full.
    RxOverrun = 1,
}

impl FaultCode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::RxOverrun,
            _ => FaultCode::None,
        }
    }
}

/// Per-instance fault state.
///
/// Only plain loads and stores: the single writer is the SERCOM interrupt,
/// except for [`clear`](Self::clear), which foreground code calls while the
/// interrupt may fire. A clear racing a new overrun leaves the flag set.
pub struct FaultState {
    active: AtomicBool,
    code: AtomicU8,
    /// Last dropped byte.
    data: AtomicU8,
    /// Dropped bytes since boot (never cleared).
    count: AtomicU32,
}

impl FaultState {
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            code: AtomicU8::new(0),
            data: AtomicU8::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Record a fault. Interrupt context only.
    #[inline]
    pub fn set(&self, code: FaultCode, data: u8) {
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        let count = self.count.load(Ordering::Relaxed);
        self.count.store(count.wrapping_add(1), Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    #[inline]
    pub fn code(&self) -> FaultCode {
        if self.is_active() {
            FaultCode::from_u8(self.code.load(Ordering::Acquire))
        } else {
            FaultCode::None
        }
    }

    #[inline]
    pub fn data(&self) -> u8 {
        self.data.load(Ordering::Acquire)
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Clear the sticky flag. The drop count is preserved.
    #[inline]
    pub fn clear(&self) {
        self.active.store(false, Ordering::Release);
    }

    #[inline]
    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            active: self.is_active(),
            code: self.code(),
            data: self.data(),
            count: self.count(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of a [`FaultState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultSnapshot {
    pub active: bool,
    pub code: FaultCode,
    pub data: u8,
    pub count: u32,
}
