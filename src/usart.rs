//! Buffered USART transport.
//!
//! # Contexts
//!
//! ```text
//! Foreground                 RingBuffer            SERCOM interrupt
//! ──────────                 ──────────            ────────────────
//! write() ── push ─────────▶ [TX] ────── pop ────▶ DRE: DATA = byte
//! read()  ◀─ pop ─────────── [RX] ◀───── push ──── RXC: byte = DATA
//! ```
//!
//! Each ring has exactly one producer and one consumer. Blocking calls spin
//! with [`nb::block!`] over the non-blocking polls, relaxing the target on
//! every miss. There is no timeout: a stuck peripheral stalls the caller
//! until reset.
//!
//! Reconfiguring buffers while a transfer is pending is the caller's
//! problem; drain first with [`SercomBus::flush`].

use core::convert::Infallible;
use core::sync::atomic::Ordering;

use crate::error::ConfigError;
use crate::fault::{FaultCode, FaultSnapshot};
use crate::registry::{InstanceId, InstanceState};
use crate::sercom::{SercomBus, UsartHandle};
use crate::target::{IntFlags, SercomTarget};
use crate::{log_debug, log_warn};

impl<'a, T: SercomTarget> SercomBus<'a, T> {
    /// Interrupt service for a USART instance.
    pub(crate) fn service_usart(&self, id: InstanceId) {
        let state = self.state(id);
        let flags = self.target().interrupt_flags(id);

        if flags.contains(IntFlags::RXC) && state.rx_irq.load(Ordering::Acquire) {
            let byte = self.target().read_data(id);
            if !state.rx.push(byte) {
                // Full: drop the incoming byte, never wait in here
                state.fault.set(FaultCode::RxOverrun, byte);
                log_warn!(
                    self.logs().interrupt,
                    self.now(),
                    "sercom{}: rx overrun, dropped 0x{:02x}",
                    id.raw(),
                    byte
                );
            }
        }

        if flags.contains(IntFlags::DRE) && state.tx_active() {
            match state.tx.pop() {
                Some(byte) => self.target().write_data(id, byte),
                None => {
                    self.target().disable_interrupts(id, IntFlags::DRE);
                    state.tx_active.store(false, Ordering::Release);
                }
            }
        }
    }

    /// Start draining the TX ring if the interrupt is not already on it.
    fn kick_tx(&self, id: InstanceId, state: &InstanceState<'a>) {
        if state.tx_active() {
            return;
        }
        // Idle: the interrupt does not touch the TX ring, prime it here
        if self.target().interrupt_flags(id).contains(IntFlags::DRE) {
            if let Some(byte) = state.tx.pop() {
                self.target().write_data(id, byte);
            }
        }
        state.tx_active.store(true, Ordering::Release);
        self.target().enable_interrupts(id, IntFlags::DRE);
    }

    fn try_write_direct(&self, id: InstanceId, byte: u8) -> nb::Result<(), Infallible> {
        if self.target().interrupt_flags(id).contains(IntFlags::DRE) {
            self.target().write_data(id, byte);
            Ok(())
        } else {
            self.target().relax();
            Err(nb::Error::WouldBlock)
        }
    }

    fn try_read_direct(&self, id: InstanceId) -> nb::Result<u8, Infallible> {
        if self.target().interrupt_flags(id).contains(IntFlags::RXC) {
            Ok(self.target().read_data(id))
        } else {
            self.target().relax();
            Err(nb::Error::WouldBlock)
        }
    }

    fn try_enqueue(&self, id: InstanceId, byte: u8) -> nb::Result<(), Infallible> {
        let state = self.state(id);
        if state.tx.push(byte) {
            self.kick_tx(id, state);
            Ok(())
        } else {
            // Full means the interrupt is draining; make sure of it
            self.kick_tx(id, state);
            self.target().relax();
            Err(nb::Error::WouldBlock)
        }
    }

    fn try_dequeue(&self, id: InstanceId) -> nb::Result<u8, Infallible> {
        match self.state(id).rx.pop() {
            Some(byte) => Ok(byte),
            None => {
                self.target().relax();
                Err(nb::Error::WouldBlock)
            }
        }
    }

    /// Non-blocking single-byte write. Buffered when a TX ring is attached.
    pub fn try_write_byte(&self, handle: &UsartHandle, byte: u8) -> nb::Result<(), Infallible> {
        let state = self.state(handle.id);
        if state.tx.is_enabled() {
            self.try_enqueue(handle.id, byte)
        } else if state.tx_active() {
            // Ring detached mid-drain; let the interrupt finish first
            self.target().relax();
            Err(nb::Error::WouldBlock)
        } else {
            self.try_write_direct(handle.id, byte)
        }
    }

    /// Non-blocking single-byte read. Buffered when an RX ring is attached.
    pub fn try_read_byte(&self, handle: &UsartHandle) -> nb::Result<u8, Infallible> {
        if self.state(handle.id).rx.is_enabled() {
            self.try_dequeue(handle.id)
        } else {
            self.try_read_direct(handle.id)
        }
    }

    /// Send `bytes`, spinning on backpressure.
    ///
    /// Returns once every byte is queued (buffered) or handed to the data
    /// register (unbuffered).
    pub fn write(&self, handle: &UsartHandle, bytes: &[u8]) {
        for &byte in bytes {
            let Ok(()) = nb::block!(self.try_write_byte(handle, byte));
        }
    }

    /// Fill `out`, spinning until every byte has arrived.
    pub fn read(&self, handle: &UsartHandle, out: &mut [u8]) {
        for slot in out.iter_mut() {
            let Ok(byte) = nb::block!(self.try_read_byte(handle));
            *slot = byte;
        }
    }

    /// Write straight to the data register, ignoring any TX ring.
    ///
    /// Waits for a running buffered drain to finish first.
    pub fn write_unbuffered(&self, handle: &UsartHandle, bytes: &[u8]) {
        let state = self.state(handle.id);
        while state.tx_active() {
            self.target().relax();
        }
        for &byte in bytes {
            let Ok(()) = nb::block!(self.try_write_direct(handle.id, byte));
        }
    }

    /// Read straight from the data register, ignoring any RX ring.
    ///
    /// With an RX ring attached the interrupt competes for the same bytes.
    pub fn read_unbuffered(&self, handle: &UsartHandle, out: &mut [u8]) {
        for slot in out.iter_mut() {
            let Ok(byte) = nb::block!(self.try_read_direct(handle.id));
            *slot = byte;
        }
    }

    /// Spin until the TX ring is drained and the data register is empty.
    pub fn flush(&self, handle: &UsartHandle) {
        let Ok(()) = nb::block!(self.try_flush(handle));
    }

    /// Non-blocking flush poll.
    pub fn try_flush(&self, handle: &UsartHandle) -> nb::Result<(), Infallible> {
        let state = self.state(handle.id);
        let idle = !state.tx_active() && state.tx.is_empty();
        if idle && self.target().interrupt_flags(handle.id).contains(IntFlags::DRE) {
            Ok(())
        } else {
            self.target().relax();
            Err(nb::Error::WouldBlock)
        }
    }

    /// Attach `storage` as the TX ring. An empty slice reverts to unbuffered.
    ///
    /// Bytes still queued in the previous ring are discarded; flush first.
    pub fn enable_tx_buffer(&self, handle: &UsartHandle, storage: &'a mut [u8]) {
        let id = handle.id;
        let state = self.state(id);
        let capacity = storage.len();

        self.target().disable_interrupts(id, IntFlags::DRE);
        state.tx_active.store(false, Ordering::Release);
        // SAFETY: DRE is masked and `tx_active` is clear, so the interrupt
        // no longer consumes from the TX ring.
        unsafe { state.tx.attach_shared(storage) };

        log_debug!(self.logs().foreground, self.now(), "sercom{}: tx buffer {}", id.raw(), capacity);
    }

    /// Attach `storage` as the RX ring. An empty slice reverts to unbuffered
    /// and masks the receive interrupt.
    pub fn enable_rx_buffer(&self, handle: &UsartHandle, storage: &'a mut [u8]) {
        let id = handle.id;
        let state = self.state(id);
        let capacity = storage.len();

        self.target().disable_interrupts(id, IntFlags::RXC);
        state.rx_irq.store(false, Ordering::Release);
        // SAFETY: RXC is masked, so the interrupt no longer produces into the
        // RX ring.
        unsafe { state.rx.attach_shared(storage) };

        if capacity > 0 {
            state.rx_irq.store(true, Ordering::Release);
            self.target().enable_interrupts(id, IntFlags::RXC);
        }

        log_debug!(self.logs().foreground, self.now(), "sercom{}: rx buffer {}", id.raw(), capacity);
    }

    /// Receive into a fresh RX ring while sending `tx`.
    ///
    /// `rx_storage` stays attached afterwards.
    pub fn transfer(&self, handle: &UsartHandle, rx_storage: &'a mut [u8], tx: &[u8], rx: &mut [u8]) {
        self.enable_rx_buffer(handle, rx_storage);
        self.write(handle, tx);
        self.read(handle, rx);
    }

    /// Overrun state of the instance.
    pub fn overrun(&self, handle: &UsartHandle) -> FaultSnapshot {
        self.state(handle.id).fault.snapshot()
    }

    /// Clear the sticky overrun flag.
    pub fn clear_overrun(&self, handle: &UsartHandle) {
        self.state(handle.id).fault.clear();
    }

    /// Byte-stream view of a configured instance.
    pub fn port(&self, handle: UsartHandle) -> SerialPort<'_, 'a, T> {
        SerialPort { bus: self, handle }
    }

    /// Port for a live instance, by number.
    pub fn open_port(&self, instance: u8) -> Result<SerialPort<'_, 'a, T>, ConfigError> {
        Ok(self.port(self.usart_handle(instance)?))
    }
}

/// A configured USART as an `embedded-hal-nb` serial port.
pub struct SerialPort<'b, 'a, T: SercomTarget> {
    bus: &'b SercomBus<'a, T>,
    handle: UsartHandle,
}

impl<'b, 'a, T: SercomTarget> SerialPort<'b, 'a, T> {
    pub fn handle(&self) -> &UsartHandle {
        &self.handle
    }

    pub fn write_all(&mut self, bytes: &[u8]) {
        self.bus.write(&self.handle, bytes);
    }

    pub fn read_exact(&mut self, out: &mut [u8]) {
        self.bus.read(&self.handle, out);
    }
}

impl<T: SercomTarget> embedded_hal_nb::serial::ErrorType for SerialPort<'_, '_, T> {
    type Error = Infallible;
}

impl<T: SercomTarget> embedded_hal_nb::serial::Read<u8> for SerialPort<'_, '_, T> {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.bus.try_read_byte(&self.handle)
    }
}

impl<T: SercomTarget> embedded_hal_nb::serial::Write<u8> for SerialPort<'_, '_, T> {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.bus.try_write_byte(&self.handle, word)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        self.bus.try_flush(&self.handle)
    }
}

impl<T: SercomTarget> core::fmt::Write for SerialPort<'_, '_, T> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.bus.write(&self.handle, s.as_bytes());
        Ok(())
    }
}
