//! Target interface.
//!
//! Thin boundary to the chip. Register layouts and bit encodings live behind
//! this trait; the crate only hands over the logical values to program and
//! polls the conditions it needs. All methods take `&self`: registers are
//! memory-mapped and the same target is touched from foreground and from the
//! SERCOM interrupt.

use bitflags::bitflags;

use crate::error::ConfigError;
use crate::pins::{Pad, Pin, PinFunction};
use crate::registry::InstanceId;

bitflags! {
    /// USART interrupt flags (INTFLAG / INTENSET / INTENCLR).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct IntFlags: u8 {
        /// Data register empty.
        const DRE = 1 << 0;
        /// Transmit complete.
        const TXC = 1 << 1;
        /// Receive complete.
        const RXC = 1 << 2;
    }
}

/// Pulse-timer block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerId {
    Tcc(u8),
    Tc(u8),
}

/// Peripheral clock to enable. The target maps this to its GCLK channel and
/// bus-mask bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockId {
    Sercom(u8),
    Timer(TimerId),
}

/// Fractional baud value (16x oversampling, 1/8 fraction).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Baud {
    /// `clock / (2 * rate)`, i.e. the baud register value in eighths.
    pub raw: u32,
}

impl Baud {
    /// Largest integer part the 13-bit BAUD field holds.
    pub const MAX_INTEGER: u32 = 0x1FFF;

    /// Compute the baud value for `rate` from a `clock_hz` peripheral clock.
    pub fn from_rate(clock_hz: u32, rate: u32) -> Result<Self, ConfigError> {
        if rate == 0 {
            return Err(ConfigError::InvalidRate(rate));
        }
        let raw = (clock_hz as u64 / (2 * rate as u64)) as u32;
        let baud = Baud { raw };
        if baud.integer() == 0 || baud.integer() > Self::MAX_INTEGER {
            return Err(ConfigError::BaudOutOfRange { rate, clock_hz });
        }
        Ok(baud)
    }

    #[inline]
    pub const fn integer(self) -> u32 {
        self.raw / 8
    }

    #[inline]
    pub const fn fraction(self) -> u8 {
        (self.raw % 8) as u8
    }
}

/// Logical USART setup.
///
/// Fixed for every frame: internal clock, LSB first, 16x fractional
/// sampling, 8 data bits, one stop bit, receiver and transmitter enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UsartFrame {
    /// RXPO: pad carrying received data.
    pub rx_pad: Pad,
    /// TXPO: pad option for TX (and XCK on pad 1). Always 0.
    pub tx_pad_option: u8,
    /// XCK routed on pad 1.
    pub with_clock: bool,
    pub baud: Baud,
}

/// Chip access used by the bus.
pub trait SercomTarget {
    /// Enable a peripheral clock. Idempotent.
    fn enable_clock(&self, clock: ClockId);

    /// Frequency of an enabled peripheral clock.
    fn clock_frequency(&self, clock: ClockId) -> u32;

    /// Bind a physical pin to a peripheral mux function.
    fn route_pin(&self, pin: Pin, function: PinFunction);

    /// Program CTRLA/CTRLB/BAUD and enable the block.
    fn program_usart(&self, instance: InstanceId, frame: &UsartFrame);

    fn interrupt_flags(&self, instance: InstanceId) -> IntFlags;

    fn enable_interrupts(&self, instance: InstanceId, flags: IntFlags);

    fn disable_interrupts(&self, instance: InstanceId, flags: IntFlags);

    fn write_data(&self, instance: InstanceId, byte: u8);

    fn read_data(&self, instance: InstanceId) -> u8;

    /// Program prescaler stage and period, normal-PWM waveform, and enable.
    fn program_timer(&self, timer: TimerId, prescaler: u8, period: u32);

    /// Timestamp for log entries.
    fn now_us(&self) -> i64 {
        0
    }

    /// Called on every iteration of a spin-wait.
    fn relax(&self) {
        core::hint::spin_loop();
    }

    /// Stop the system on an unrecoverable configuration error.
    fn shutdown(&self, reason: &ConfigError) -> !;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baud_split() {
        // 48 MHz / (2 * 115200) = 208 -> 26 + 0/8
        let baud = Baud::from_rate(48_000_000, 115_200).unwrap();
        assert_eq!(baud.raw, 208);
        assert_eq!(baud.integer(), 26);
        assert_eq!(baud.fraction(), 0);

        // 48 MHz / (2 * 250000) = 96 -> 12 + 0/8
        let baud = Baud::from_rate(48_000_000, 250_000).unwrap();
        assert_eq!((baud.integer(), baud.fraction()), (12, 0));

        // 48 MHz / (2 * 38400) = 625 -> 78 + 1/8
        let baud = Baud::from_rate(48_000_000, 38_400).unwrap();
        assert_eq!((baud.integer(), baud.fraction()), (78, 1));
    }

    #[test]
    fn test_baud_rejects_zero_rate() {
        assert_eq!(Baud::from_rate(48_000_000, 0), Err(ConfigError::InvalidRate(0)));
    }

    #[test]
    fn test_baud_out_of_range() {
        assert!(matches!(
            Baud::from_rate(48_000_000, 10_000_000),
            Err(ConfigError::BaudOutOfRange { .. })
        ));
        assert!(matches!(
            Baud::from_rate(48_000_000, 100),
            Err(ConfigError::BaudOutOfRange { .. })
        ));
    }
}
