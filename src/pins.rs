//! Pin/pad resolver.
//!
//! Each SERCOM block exposes four internal pads (0-3). Every pad can be
//! routed to a handful of physical pins through the port multiplexer. The
//! tables below list, per chip variant, which (instance, pin) pairs exist,
//! which pad they land on and which mux function selects them.
//!
//! Lookups are a linear search over immutable tables. A miss is reported as
//! [`ConfigError::UnmappedPin`]; there is no fallback pad.

use core::fmt;

use crate::config::Variant;
use crate::error::ConfigError;

/// SERCOM pad index (0-3).
pub type Pad = u8;

/// Physical GPIO, encoded as `port * 32 + number`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pin(u8);

impl Pin {
    /// Pin from port letter and number, e.g. `Pin::new('A', 8)` for PA08.
    pub const fn new(port: char, num: u8) -> Self {
        Pin((port as u8 - b'A') * 32 + num)
    }

    pub const fn from_raw(raw: u8) -> Self {
        Pin(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub const fn port(self) -> char {
        (b'A' + self.0 / 32) as char
    }

    pub const fn number(self) -> u8 {
        self.0 % 32
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{:02}", self.port(), self.number())
    }
}

/// Port multiplexer function letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinFunction {
    C,
    D,
    E,
    F,
    G,
}

/// Logical purpose a pin plays for an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PinRole {
    Tx = 0,
    Rx = 1,
    Clk = 2,
}

impl PinRole {
    pub const ALL: [PinRole; 3] = [PinRole::Tx, PinRole::Rx, PinRole::Clk];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Role from its wire enumeration ("tx" = 0, "rx" = 1, "clk" = 2).
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(PinRole::Tx),
            1 => Some(PinRole::Rx),
            2 => Some(PinRole::Clk),
            _ => None,
        }
    }
}

/// One compiled-in routing option.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PadEntry {
    pub instance: u8,
    pub pin: Pin,
    pub pad: Pad,
    pub function: PinFunction,
}

const fn entry(instance: u8, port: char, num: u8, pad: Pad, function: PinFunction) -> PadEntry {
    PadEntry {
        instance,
        pin: Pin::new(port, num),
        pad,
        function,
    }
}

use PinFunction::{C, D};

static SAMD21_PADS: &[PadEntry] = &[
    entry(0, 'A', 8, 0, C),
    entry(0, 'A', 9, 1, C),
    entry(0, 'A', 10, 2, C),
    entry(0, 'A', 11, 3, C),
    entry(0, 'A', 4, 0, D),
    entry(0, 'A', 5, 1, D),
    entry(0, 'A', 6, 2, D),
    entry(0, 'A', 7, 3, D),
    entry(1, 'A', 16, 0, C),
    entry(1, 'A', 17, 1, C),
    entry(1, 'A', 18, 2, C),
    entry(1, 'A', 19, 3, C),
    entry(1, 'A', 0, 0, D),
    entry(1, 'A', 1, 1, D),
    entry(1, 'A', 30, 2, D),
    entry(1, 'A', 31, 3, D),
    entry(2, 'A', 12, 0, C),
    entry(2, 'A', 13, 1, C),
    entry(2, 'A', 14, 2, C),
    entry(2, 'A', 15, 3, C),
    entry(2, 'A', 8, 0, D),
    entry(2, 'A', 9, 1, D),
    entry(2, 'A', 10, 2, D),
    entry(2, 'A', 11, 3, D),
    entry(3, 'A', 22, 0, C),
    entry(3, 'A', 23, 1, C),
    entry(3, 'A', 24, 2, C),
    entry(3, 'A', 25, 3, C),
    entry(3, 'A', 16, 0, D),
    entry(3, 'A', 17, 1, D),
    entry(3, 'A', 18, 2, D),
    entry(3, 'A', 19, 3, D),
    entry(3, 'A', 20, 2, D),
    entry(3, 'A', 21, 3, D),
    entry(4, 'B', 12, 0, C),
    entry(4, 'B', 13, 1, C),
    entry(4, 'B', 14, 2, C),
    entry(4, 'B', 15, 3, C),
    entry(4, 'B', 8, 0, D),
    entry(4, 'B', 9, 1, D),
    entry(4, 'B', 10, 2, D),
    entry(4, 'B', 11, 3, D),
    entry(4, 'A', 12, 0, D),
    entry(4, 'A', 13, 1, D),
    entry(4, 'A', 14, 2, D),
    entry(4, 'A', 15, 3, D),
    entry(5, 'B', 16, 0, C),
    entry(5, 'B', 17, 1, C),
    entry(5, 'A', 20, 2, C),
    entry(5, 'A', 21, 3, C),
    entry(5, 'A', 22, 0, D),
    entry(5, 'A', 23, 1, D),
    entry(5, 'A', 24, 2, D),
    entry(5, 'A', 25, 3, D),
    entry(5, 'B', 30, 0, D),
    entry(5, 'B', 31, 1, D),
    entry(5, 'B', 22, 2, D),
    entry(5, 'B', 23, 3, D),
    entry(5, 'B', 2, 0, D),
    entry(5, 'B', 3, 1, D),
    entry(5, 'B', 0, 2, D),
    entry(5, 'B', 1, 3, D),
];

static SAMX5_PADS: &[PadEntry] = &[
    entry(0, 'A', 8, 0, C),
    entry(0, 'A', 9, 1, C),
    entry(0, 'A', 10, 2, C),
    entry(0, 'A', 11, 3, C),
    entry(0, 'B', 24, 0, C),
    entry(0, 'B', 25, 1, C),
    entry(0, 'C', 24, 2, C),
    entry(0, 'C', 25, 3, C),
    entry(0, 'A', 4, 0, D),
    entry(0, 'A', 5, 1, D),
    entry(0, 'A', 6, 2, D),
    entry(0, 'A', 7, 3, D),
    entry(0, 'C', 17, 0, D),
    entry(0, 'C', 16, 1, D),
    entry(0, 'C', 18, 2, D),
    entry(0, 'C', 19, 3, D),
    entry(1, 'A', 16, 0, C),
    entry(1, 'A', 17, 1, C),
    entry(1, 'A', 18, 2, C),
    entry(1, 'A', 19, 3, C),
    entry(1, 'C', 22, 0, C),
    entry(1, 'C', 23, 1, C),
    entry(1, 'D', 20, 2, C),
    entry(1, 'D', 21, 3, C),
    entry(1, 'C', 27, 0, C),
    entry(1, 'C', 28, 1, C),
    entry(1, 'B', 22, 2, C),
    entry(1, 'B', 23, 3, C),
    entry(1, 'A', 0, 0, D),
    entry(1, 'A', 1, 1, D),
    entry(1, 'A', 30, 2, D),
    entry(1, 'A', 31, 3, D),
    entry(2, 'A', 12, 0, C),
    entry(2, 'A', 13, 1, C),
    entry(2, 'A', 14, 2, C),
    entry(2, 'A', 15, 3, C),
    entry(2, 'B', 26, 0, C),
    entry(2, 'B', 27, 1, C),
    entry(2, 'B', 28, 2, C),
    entry(2, 'B', 29, 3, C),
    entry(2, 'A', 9, 0, D),
    entry(2, 'A', 8, 1, D),
    entry(2, 'A', 10, 2, D),
    entry(2, 'A', 11, 3, D),
    entry(2, 'B', 25, 0, D),
    entry(2, 'B', 24, 1, D),
    entry(2, 'C', 24, 2, D),
    entry(2, 'C', 25, 3, D),
    entry(3, 'A', 22, 0, C),
    entry(3, 'A', 23, 1, C),
    entry(3, 'A', 24, 2, C),
    entry(3, 'A', 25, 3, C),
    entry(3, 'B', 20, 0, C),
    entry(3, 'B', 21, 1, C),
    entry(3, 'A', 20, 2, D),
    entry(3, 'A', 21, 3, D),
    entry(3, 'A', 17, 0, D),
    entry(3, 'A', 16, 1, D),
    entry(3, 'A', 18, 2, D),
    entry(3, 'A', 19, 3, D),
    entry(3, 'C', 23, 0, D),
    entry(3, 'C', 22, 1, D),
    entry(3, 'D', 20, 2, D),
    entry(3, 'D', 21, 3, D),
    entry(4, 'B', 12, 0, C),
    entry(4, 'B', 13, 1, C),
    entry(4, 'B', 14, 2, C),
    entry(4, 'B', 15, 3, C),
    entry(4, 'B', 8, 0, D),
    entry(4, 'B', 9, 1, D),
    entry(4, 'B', 10, 2, D),
    entry(4, 'B', 11, 3, D),
    entry(4, 'A', 13, 0, D),
    entry(4, 'A', 12, 1, D),
    entry(4, 'A', 14, 2, D),
    entry(4, 'A', 15, 3, D),
    entry(4, 'B', 27, 0, D),
    entry(4, 'B', 26, 1, D),
    entry(4, 'B', 28, 2, D),
    entry(4, 'B', 29, 3, D),
    entry(5, 'B', 16, 0, C),
    entry(5, 'B', 17, 1, C),
    entry(5, 'B', 18, 2, C),
    entry(5, 'B', 19, 3, C),
    entry(5, 'A', 23, 0, D),
    entry(5, 'A', 22, 1, D),
    entry(5, 'A', 20, 2, D),
    entry(5, 'A', 21, 3, D),
    entry(5, 'A', 24, 2, D),
    entry(5, 'A', 25, 3, D),
    entry(5, 'B', 22, 2, D),
    entry(5, 'B', 23, 3, D),
    entry(5, 'B', 31, 0, D),
    entry(5, 'B', 30, 1, D),
    entry(5, 'B', 0, 2, D),
    entry(5, 'B', 1, 3, D),
    entry(5, 'B', 2, 0, D),
    entry(5, 'B', 3, 1, D),
    entry(6, 'C', 16, 0, C),
    entry(6, 'C', 17, 1, C),
    entry(6, 'C', 18, 2, C),
    entry(6, 'C', 19, 3, C),
    entry(6, 'C', 4, 0, C),
    entry(6, 'C', 5, 1, C),
    entry(6, 'C', 6, 2, C),
    entry(6, 'C', 7, 3, C),
    entry(6, 'D', 9, 0, D),
    entry(6, 'D', 8, 1, D),
    entry(6, 'D', 10, 2, D),
    entry(6, 'D', 11, 3, D),
    entry(6, 'C', 13, 0, D),
    entry(6, 'C', 12, 1, D),
    entry(6, 'C', 14, 2, D),
    entry(6, 'C', 15, 3, D),
    entry(6, 'C', 10, 2, C),
    entry(6, 'C', 11, 3, C),
    entry(7, 'C', 12, 0, C),
    entry(7, 'C', 13, 1, C),
    entry(7, 'C', 14, 2, C),
    entry(7, 'C', 15, 3, C),
    entry(7, 'D', 8, 0, C),
    entry(7, 'D', 9, 1, C),
    entry(7, 'D', 10, 2, C),
    entry(7, 'D', 11, 3, C),
    entry(7, 'C', 10, 2, D),
    entry(7, 'C', 11, 3, D),
    entry(7, 'B', 21, 0, D),
    entry(7, 'B', 20, 1, D),
    entry(7, 'B', 18, 2, D),
    entry(7, 'B', 19, 3, D),
    entry(7, 'B', 30, 0, C),
    entry(7, 'B', 31, 1, C),
    entry(7, 'A', 30, 2, C),
    entry(7, 'A', 31, 3, C),
];

/// Pad table for a variant.
pub fn pad_table(variant: Variant) -> &'static [PadEntry] {
    match variant {
        Variant::Samd21 => SAMD21_PADS,
        Variant::Samx5 => SAMX5_PADS,
    }
}

/// Find the routing entry for `pin` on SERCOM `instance`.
pub fn resolve(variant: Variant, instance: u8, pin: Pin) -> Result<PadEntry, ConfigError> {
    pad_table(variant)
        .iter()
        .find(|e| e.instance == instance && e.pin == pin)
        .copied()
        .ok_or(ConfigError::UnmappedPin { instance, pin })
}

/// (TX pad, CLK pad) -> DOPO.
#[derive(Clone, Copy, Debug)]
struct SpiMap {
    tx_pad: Pad,
    clk_pad: Pad,
    dopo: u8,
    samd21_only: bool,
}

static SPI_DOPO: &[SpiMap] = &[
    SpiMap { tx_pad: 0, clk_pad: 1, dopo: 0, samd21_only: false },
    SpiMap { tx_pad: 3, clk_pad: 1, dopo: 2, samd21_only: false },
    SpiMap { tx_pad: 2, clk_pad: 3, dopo: 1, samd21_only: true },
    SpiMap { tx_pad: 0, clk_pad: 3, dopo: 3, samd21_only: true },
];

/// DOPO code for a TX/CLK pad pair.
pub fn spi_dopo(variant: Variant, tx_pad: Pad, clk_pad: Pad) -> Result<u8, ConfigError> {
    SPI_DOPO
        .iter()
        .filter(|m| !m.samd21_only || variant == Variant::Samd21)
        .find(|m| m.tx_pad == tx_pad && m.clk_pad == clk_pad)
        .map(|m| m.dopo)
        .ok_or(ConfigError::InvalidSpiPads { tx: tx_pad, clk: clk_pad })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_encoding() {
        let pin = Pin::new('B', 22);
        assert_eq!(pin.raw(), 54);
        assert_eq!(pin.port(), 'B');
        assert_eq!(pin.number(), 22);
        assert_eq!(Pin::from_raw(54), pin);
    }

    #[test]
    fn test_pin_display() {
        assert_eq!(std::format!("{}", Pin::new('A', 8)), "PA08");
        assert_eq!(std::format!("{}", Pin::new('D', 21)), "PD21");
    }

    #[test]
    fn test_role_wire_values() {
        assert_eq!(PinRole::from_u8(0), Some(PinRole::Tx));
        assert_eq!(PinRole::from_u8(2), Some(PinRole::Clk));
        assert_eq!(PinRole::from_u8(3), None);
    }

    #[test]
    fn test_tables_stay_within_instance_count() {
        for variant in [Variant::Samd21, Variant::Samx5] {
            for e in pad_table(variant) {
                assert!((e.instance as usize) < variant.instance_count());
                assert!(e.pad < 4);
            }
        }
    }
}
