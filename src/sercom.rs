//! SERCOM bus.
//!
//! Owns the registry, the interrupt dispatcher, the pulse-timer state and
//! the log streams, and drives the target through them. This module covers
//! pin role assignment, pad resolution with per-mode constraints, one-shot
//! USART programming and the shared interrupt entry point. The transport
//! lives in [`usart`](crate::usart), pulse timers in [`pwm`](crate::pwm).
//!
//! # Lifecycle
//!
//! ```text
//! set_pin_role() ──▶ configure_usart() ──▶ UsartHandle
//!   (any number)      UNCONFIGURED → CONFIGURED (once, never back)
//! ```
//!
//! A live instance is never reprogrammed: replaying the same configuration
//! returns the same handle, anything else is a [`ConfigError`].

use core::sync::atomic::Ordering;

use crate::config::{BusConfig, Variant};
use crate::dispatch::{Dispatcher, InterruptHandler};
use crate::error::ConfigError;
use crate::logging::BusLogs;
use crate::pins::{self, Pad, PadEntry, Pin, PinRole};
use crate::pwm::PulseTimers;
use crate::registry::{InstanceId, InstanceState, Programmed, Registry};
use crate::target::{Baud, IntFlags, SercomTarget, UsartFrame};
use crate::{log_debug, log_error, log_info, log_warn};

/// USART flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum UsartMode {
    /// Asynchronous, TX + RX only.
    Uart = 1,
    /// Asynchronous with an XCK clock output on pad 1.
    Clocked = 2,
}

impl UsartMode {
    #[inline]
    pub const fn has_clock(self) -> bool {
        matches!(self, UsartMode::Clocked)
    }

    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(UsartMode::Uart),
            2 => Some(UsartMode::Clocked),
            _ => None,
        }
    }
}

/// Which pad rules apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PadMode {
    Usart(UsartMode),
    Spi,
    I2c,
}

/// Resolved pads for an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PadRouting {
    pub tx: PadEntry,
    pub rx: Option<PadEntry>,
    pub clk: Option<PadEntry>,
}

impl PadRouting {
    fn entries(&self) -> impl Iterator<Item = &PadEntry> {
        core::iter::once(&self.tx).chain(self.rx.iter()).chain(self.clk.iter())
    }
}

/// Host-link pad selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SerialPads {
    /// RXPO.
    pub rx_pad: Pad,
    /// TXPO.
    pub tx_pad_option: u8,
}

/// SPI pad selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpiPads {
    /// Data-in pad (RX).
    pub dipo: u8,
    /// Data-out / clock pad combination.
    pub dopo: u8,
}

/// A configured USART instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UsartHandle {
    pub id: InstanceId,
    pub mode: UsartMode,
    pub rate: u32,
    pub baud: Baud,
}

/// Shared SERCOM resources and the target driving them.
pub struct SercomBus<'a, T: SercomTarget> {
    target: T,
    config: BusConfig,
    pub(crate) registry: Registry<'a>,
    dispatcher: Dispatcher,
    pub(crate) timers: PulseTimers,
    logs: BusLogs,
}

impl<'a, T: SercomTarget> SercomBus<'a, T> {
    pub fn new(target: T, config: BusConfig) -> Self {
        Self {
            target,
            config,
            registry: Registry::new(),
            dispatcher: Dispatcher::new(),
            timers: PulseTimers::new(),
            logs: BusLogs::new(),
        }
    }

    #[inline]
    pub fn target(&self) -> &T {
        &self.target
    }

    #[inline]
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    #[inline]
    pub fn variant(&self) -> Variant {
        self.config.variant
    }

    #[inline]
    pub fn registry(&self) -> &Registry<'a> {
        &self.registry
    }

    #[inline]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[inline]
    pub fn logs(&self) -> &BusLogs {
        &self.logs
    }

    /// Validate an instance number for this part.
    pub fn instance(&self, instance: u8) -> Result<InstanceId, ConfigError> {
        InstanceId::new(instance, self.variant())
    }

    #[inline]
    pub fn state(&self, id: InstanceId) -> &InstanceState<'a> {
        self.registry.get(id)
    }

    #[inline]
    pub(crate) fn now(&self) -> i64 {
        self.target.now_us()
    }

    /// Log a configuration failure and hand it back.
    pub(crate) fn fail(&self, err: ConfigError) -> ConfigError {
        log_error!(self.logs.foreground, self.now(), "{}", err);
        err
    }

    /// Assign `pin` to `role` on `instance`.
    ///
    /// Roles are frozen once the instance is live; later calls are ignored.
    pub fn set_pin_role(&self, instance: u8, role: PinRole, pin: Pin) -> Result<(), ConfigError> {
        let id = self.instance(instance).map_err(|e| self.fail(e))?;
        let state = self.registry.get(id);
        if state.is_live() {
            log_warn!(
                self.logs.foreground,
                self.now(),
                "sercom{}: {:?} pin change to {} ignored, instance live",
                instance,
                role,
                pin
            );
            return Ok(());
        }
        state.set_pin(role, pin);
        Ok(())
    }

    fn resolve_role(&self, id: InstanceId, role: PinRole) -> Result<PadEntry, ConfigError> {
        let pin = self.registry.get(id).pin(role).ok_or(ConfigError::UnassignedPin {
            instance: id.raw(),
            role,
        })?;
        pins::resolve(self.variant(), id.raw(), pin)
    }

    /// Resolve the assigned pins of `id` and check the pad rules for `mode`.
    ///
    /// Pure with respect to the hardware: nothing is routed.
    pub fn resolve_pads(&self, id: InstanceId, mode: PadMode) -> Result<PadRouting, ConfigError> {
        match mode {
            PadMode::Usart(usart) => {
                let tx = self.resolve_role(id, PinRole::Tx)?;
                let rx = self.resolve_role(id, PinRole::Rx)?;
                let clk = if usart.has_clock() {
                    Some(self.resolve_role(id, PinRole::Clk)?)
                } else {
                    None
                };

                // TX is 0, CLK is 1 or none, RX any remaining
                if tx.pad != 0 || rx.pad == tx.pad {
                    return Err(ConfigError::TxPadConstraint { tx: tx.pad, rx: rx.pad });
                }
                if let Some(clk) = clk {
                    if clk.pad != 1 || rx.pad == clk.pad {
                        return Err(ConfigError::ClockPadConstraint { clk: clk.pad, rx: rx.pad });
                    }
                }
                Ok(PadRouting { tx, rx: Some(rx), clk })
            }
            PadMode::Spi => {
                let tx = self.resolve_role(id, PinRole::Tx)?;
                let rx = self.resolve_role(id, PinRole::Rx)?;
                let clk = self.resolve_role(id, PinRole::Clk)?;

                pins::spi_dopo(self.variant(), tx.pad, clk.pad)?;
                if rx.pad == tx.pad || rx.pad == clk.pad {
                    return Err(ConfigError::SpiRxCollision { rx: rx.pad });
                }
                Ok(PadRouting { tx, rx: Some(rx), clk: Some(clk) })
            }
            PadMode::I2c => {
                let tx = self.resolve_role(id, PinRole::Tx)?;
                let clk = self.resolve_role(id, PinRole::Clk)?;

                if tx.pad != 0 || clk.pad != 1 {
                    return Err(ConfigError::I2cPads { tx: tx.pad, clk: clk.pad });
                }
                Ok(PadRouting { tx, rx: None, clk: Some(clk) })
            }
        }
    }

    fn route(&self, routing: &PadRouting) {
        for entry in routing.entries() {
            self.target.route_pin(entry.pin, entry.function);
        }
    }

    /// Route an explicit TX/RX pair for the board's own host link.
    ///
    /// Bypasses the registry; no pad constraint beyond both pins existing.
    pub fn serial_pins(&self, instance: u8, tx: Pin, rx: Pin) -> Result<SerialPads, ConfigError> {
        let id = self.instance(instance).map_err(|e| self.fail(e))?;
        let tx = pins::resolve(self.variant(), id.raw(), tx).map_err(|e| self.fail(e))?;
        let rx = pins::resolve(self.variant(), id.raw(), rx).map_err(|e| self.fail(e))?;

        self.target.route_pin(tx.pin, tx.function);
        self.target.route_pin(rx.pin, rx.function);
        Ok(SerialPads {
            rx_pad: rx.pad,
            tx_pad_option: 0,
        })
    }

    fn claim_for_protocol(&self, instance: u8) -> Result<InstanceId, ConfigError> {
        let id = self.instance(instance)?;
        if self.registry.get(id).is_live() {
            return Err(ConfigError::ConflictingConfiguration(instance));
        }
        Ok(id)
    }

    /// Resolve and route SPI pads for `instance`.
    pub fn spi_pins(&self, instance: u8) -> Result<SpiPads, ConfigError> {
        let id = self.claim_for_protocol(instance).map_err(|e| self.fail(e))?;
        let routing = self.resolve_pads(id, PadMode::Spi).map_err(|e| self.fail(e))?;
        let dipo = routing.rx.map(|rx| rx.pad).unwrap_or_default();
        let clk = routing.clk.map(|clk| clk.pad).unwrap_or_default();
        let dopo = pins::spi_dopo(self.variant(), routing.tx.pad, clk).map_err(|e| self.fail(e))?;

        self.route(&routing);
        Ok(SpiPads { dipo, dopo })
    }

    /// Resolve and route I2C pads (SDA on TX, SCL on CLK) for `instance`.
    pub fn i2c_pins(&self, instance: u8) -> Result<(), ConfigError> {
        let id = self.claim_for_protocol(instance).map_err(|e| self.fail(e))?;
        let routing = self.resolve_pads(id, PadMode::I2c).map_err(|e| self.fail(e))?;
        self.route(&routing);
        Ok(())
    }

    /// Configure `instance` as an asynchronous USART at `rate` baud.
    ///
    /// First call routes pins, enables the clock, programs the block and
    /// binds the interrupt. Replaying identical parameters touches no
    /// hardware. Different parameters on a live instance fail.
    pub fn configure_usart(&self, instance: u8, mode: UsartMode, rate: u32) -> Result<UsartHandle, ConfigError> {
        self.try_configure_usart(instance, mode, rate).map_err(|e| self.fail(e))
    }

    fn try_configure_usart(&self, instance: u8, mode: UsartMode, rate: u32) -> Result<UsartHandle, ConfigError> {
        let id = self.instance(instance)?;
        if self.config.host_serial == Some(id) {
            return Err(ConfigError::ReservedInstance(instance));
        }

        let state = self.registry.get(id);
        if let Some(programmed) = state.programmed() {
            if programmed.mode != mode as u8 || programmed.rate != rate {
                return Err(ConfigError::ConflictingConfiguration(instance));
            }
            log_debug!(self.logs.foreground, self.now(), "sercom{}: configuration replayed", instance);
            return Ok(UsartHandle {
                id,
                mode,
                rate,
                baud: Baud { raw: programmed.baud },
            });
        }

        if rate == 0 {
            return Err(ConfigError::InvalidRate(rate));
        }
        let routing = self.resolve_pads(id, PadMode::Usart(mode))?;
        self.route(&routing);

        self.target.enable_clock(id.clock());
        let clock_hz = self.target.clock_frequency(id.clock());
        let baud = Baud::from_rate(clock_hz, rate)?;

        let frame = UsartFrame {
            rx_pad: routing.rx.map(|rx| rx.pad).unwrap_or_default(),
            tx_pad_option: 0,
            with_clock: mode.has_clock(),
            baud,
        };
        self.target.program_usart(id, &frame);
        state.mark_live(Programmed {
            mode: mode as u8,
            rate,
            baud: baud.raw,
        });

        self.dispatcher.bind(id, InterruptHandler::Usart);
        if state.rx.is_enabled() {
            state.rx_irq.store(true, Ordering::Release);
            self.target.enable_interrupts(id, IntFlags::RXC);
        }

        log_info!(
            self.logs.foreground,
            self.now(),
            "sercom{}: {:?} {} baud (BAUD {}+{}/8, RXPO {})",
            instance,
            mode,
            rate,
            baud.integer(),
            baud.fraction(),
            frame.rx_pad
        );

        Ok(UsartHandle { id, mode, rate, baud })
    }

    /// Handle of a live USART instance.
    pub fn usart_handle(&self, instance: u8) -> Result<UsartHandle, ConfigError> {
        let id = self.instance(instance)?;
        let programmed = self
            .registry
            .get(id)
            .programmed()
            .ok_or(ConfigError::NotConfigured(instance))?;
        let mode = UsartMode::from_u8(programmed.mode).ok_or(ConfigError::NotConfigured(instance))?;
        Ok(UsartHandle {
            id,
            mode,
            rate: programmed.rate,
            baud: Baud { raw: programmed.baud },
        })
    }

    /// Shared SERCOM interrupt entry. Call from every SERCOM vector.
    ///
    /// Unknown instances, the host link and unbound slots are ignored.
    pub fn on_interrupt(&self, instance: u8) {
        let Ok(id) = self.instance(instance) else {
            return;
        };
        if self.config.host_serial == Some(id) {
            return;
        }
        match self.dispatcher.handler(id) {
            InterruptHandler::Unassigned => {}
            InterruptHandler::Usart => self.service_usart(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usart_mode_codes() {
        assert_eq!(UsartMode::from_u8(UsartMode::Uart as u8), Some(UsartMode::Uart));
        assert_eq!(UsartMode::from_u8(UsartMode::Clocked as u8), Some(UsartMode::Clocked));
        assert_eq!(UsartMode::from_u8(0), None);
        assert!(UsartMode::Clocked.has_clock());
        assert!(!UsartMode::Uart.has_clock());
    }
}
