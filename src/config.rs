//! Module: config
//!
//! Purpose: Chip variant selection and bus-wide configuration.
//!
//! The variant decides which pad table, SPI DOPO table, PWM pin table and
//! instance count apply. Cargo features pick [`Variant::DEFAULT`]; a
//! [`BusConfig`] can still name the other variant at runtime.

use crate::registry::InstanceId;

/// Upper bound on SERCOM instances across all supported parts.
pub const MAX_SERCOMS: usize = 8;

/// Supported microcontroller families.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// SAMD21 (SERCOM0-5).
    Samd21,
    /// SAMD51 / SAME51 / SAME54 (SERCOM0-7).
    Samx5,
}

impl Variant {
    /// Variant selected by Cargo feature.
    #[cfg(not(feature = "samx5"))]
    pub const DEFAULT: Variant = Variant::Samd21;

    /// Variant selected by Cargo feature.
    #[cfg(feature = "samx5")]
    pub const DEFAULT: Variant = Variant::Samx5;

    /// Number of SERCOM blocks on the part.
    pub const fn instance_count(self) -> usize {
        match self {
            Variant::Samd21 => 6,
            Variant::Samx5 => 8,
        }
    }
}

impl Default for Variant {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Bus-wide configuration, fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusConfig {
    pub variant: Variant,
    /// Instance driving the board's own host link. Its interrupt vector is
    /// never dispatched and it cannot be configured through the bus.
    pub host_serial: Option<InstanceId>,
}

impl BusConfig {
    pub const fn new(variant: Variant) -> Self {
        Self {
            variant,
            host_serial: None,
        }
    }

    pub const fn with_host_serial(mut self, instance: InstanceId) -> Self {
        self.host_serial = Some(instance);
        self
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::new(Variant::DEFAULT)
    }
}
