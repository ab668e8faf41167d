//! USART host commands.
//!
//! Typed handlers for the usart command set, keyed by object id (oid).
//! Message framing and response encoding belong to the caller. Every
//! configuration error here is fatal: it goes to
//! [`SercomTarget::shutdown`] and never returns.

use crate::error::ConfigError;
use crate::pins::{Pin, PinRole};
use crate::sercom::{SercomBus, UsartHandle, UsartMode};
use crate::target::SercomTarget;

/// Command dispatcher with a fixed table of `N` USART devices.
pub struct UsartCommands<'b, 'a, T: SercomTarget, const N: usize> {
    bus: &'b SercomBus<'a, T>,
    devices: [Option<UsartHandle>; N],
}

impl<'b, 'a, T: SercomTarget, const N: usize> UsartCommands<'b, 'a, T, N> {
    pub fn new(bus: &'b SercomBus<'a, T>) -> Self {
        Self { bus, devices: [None; N] }
    }

    pub fn bus(&self) -> &'b SercomBus<'a, T> {
        self.bus
    }

    fn check<R>(&self, result: Result<R, ConfigError>) -> R {
        match result {
            Ok(value) => value,
            Err(err) => self.bus.target().shutdown(&err),
        }
    }

    /// Device bound to `oid`.
    pub fn lookup(&self, oid: u8) -> UsartHandle {
        let handle = self
            .devices
            .get(oid as usize)
            .copied()
            .flatten()
            .ok_or(ConfigError::InvalidOid(oid));
        self.check(handle)
    }

    fn alloc(&mut self, oid: u8, bus: u8, mode: UsartMode, rate: u32) {
        let result = match self.devices.get(oid as usize) {
            None => Err(ConfigError::InvalidOid(oid)),
            Some(Some(_)) => Err(ConfigError::OidInUse(oid)),
            Some(None) => self.bus.configure_usart(bus, mode, rate),
        };
        let handle = self.check(result);
        self.devices[oid as usize] = Some(handle);
    }

    /// `set_sercom_pin bus=%u sercom_pin_type=%c pin=%u`
    pub fn set_sercom_pin(&mut self, bus: u8, role: PinRole, pin: Pin) {
        let result = self.bus.set_pin_role(bus, role, pin);
        self.check(result);
    }

    /// `config_usart oid=%c usart_bus=%u rate=%u`
    pub fn config_usart(&mut self, oid: u8, bus: u8, rate: u32) {
        self.alloc(oid, bus, UsartMode::Clocked, rate);
    }

    /// `config_uart oid=%c uart_bus=%u rate=%u`
    pub fn config_uart(&mut self, oid: u8, bus: u8, rate: u32) {
        self.alloc(oid, bus, UsartMode::Uart, rate);
    }

    /// `usart_write oid=%c data=%*s`
    pub fn usart_write(&mut self, oid: u8, data: &[u8]) {
        let handle = self.lookup(oid);
        self.bus.write(&handle, data);
    }

    /// `usart_read oid=%c read_len=%u`, response bytes in `out`.
    pub fn usart_read(&mut self, oid: u8, out: &mut [u8]) {
        let handle = self.lookup(oid);
        self.bus.read(&handle, out);
    }

    /// `usart_transfer oid=%c data=%*s read_len=%u`
    ///
    /// `rx_storage` becomes the device's RX buffer for the reply.
    pub fn usart_transfer(&mut self, oid: u8, data: &[u8], rx_storage: &'a mut [u8], out: &mut [u8]) {
        let handle = self.lookup(oid);
        self.bus.transfer(&handle, rx_storage, data, out);
    }

    /// `usart_write_unbuffered oid=%c data=%*s`
    pub fn usart_write_unbuffered(&mut self, oid: u8, data: &[u8]) {
        let handle = self.lookup(oid);
        self.bus.write_unbuffered(&handle, data);
    }

    /// `usart_read_unbuffered oid=%c read_len=%u`
    pub fn usart_read_unbuffered(&mut self, oid: u8, out: &mut [u8]) {
        let handle = self.lookup(oid);
        self.bus.read_unbuffered(&handle, out);
    }

    /// Attach (or, with an empty slice, detach) the TX buffer.
    pub fn usart_set_tx_buffer(&mut self, oid: u8, storage: &'a mut [u8]) {
        let handle = self.lookup(oid);
        self.bus.enable_tx_buffer(&handle, storage);
    }

    /// Attach (or, with an empty slice, detach) the RX buffer.
    pub fn usart_set_rx_buffer(&mut self, oid: u8, storage: &'a mut [u8]) {
        let handle = self.lookup(oid);
        self.bus.enable_rx_buffer(&handle, storage);
    }
}
