//! Configuration errors.
//!
//! Every variant describes a firmware or host misconfiguration detected at
//! setup time. None of them is recoverable locally: the command layer hands
//! them to [`SercomTarget::shutdown`](crate::target::SercomTarget::shutdown).

use crate::pins::{Pad, Pin, PinRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid SERCOM bus {0}")]
    InvalidBus(u8),

    #[error("sercom{instance}: no pin assigned for role {role:?}")]
    UnassignedPin { instance: u8, role: PinRole },

    #[error("Invalid SERCOM configuration: pin {pin} not routable to sercom{instance}")]
    UnmappedPin { instance: u8, pin: Pin },

    #[error("TX pin not on PAD0 or RX pin collides with TX pin")]
    TxPadConstraint { tx: Pad, rx: Pad },

    #[error("CLK pin not on PAD1 or RX pin collides with CLK pin")]
    ClockPadConstraint { clk: Pad, rx: Pad },

    #[error("Invalid combination of TX pin and CLK pin")]
    InvalidSpiPads { tx: Pad, clk: Pad },

    #[error("Sercom RX pad collides with TX or CLK pad")]
    SpiRxCollision { rx: Pad },

    #[error("TX pin not on PAD0 or CLK pin not on PAD1")]
    I2cPads { tx: Pad, clk: Pad },

    #[error("Invalid baud rate {0}")]
    InvalidRate(u32),

    #[error("Baud rate {rate} unreachable from {clock_hz} Hz")]
    BaudOutOfRange { rate: u32, clock_hz: u32 },

    #[error("sercom{0} already configured with different parameters")]
    ConflictingConfiguration(u8),

    #[error("sercom{0} is reserved for the host serial link")]
    ReservedInstance(u8),

    #[error("sercom{0} not configured")]
    NotConfigured(u8),

    #[error("Not a valid PWM pin: {0}")]
    InvalidPwmPin(Pin),

    #[error("PWM already programmed at different speed")]
    PwmSpeedConflict,

    #[error("Invalid oid {0}")]
    InvalidOid(u8),

    #[error("oid {0} already allocated")]
    OidInUse(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_fault() {
        assert_eq!(ConfigError::InvalidBus(9).to_string(), "Invalid SERCOM bus 9");
        assert_eq!(
            ConfigError::PwmSpeedConflict.to_string(),
            "PWM already programmed at different speed"
        );
        let msg = ConfigError::UnmappedPin { instance: 2, pin: Pin::new('A', 3) }.to_string();
        assert!(msg.contains("PA03"));
        assert!(msg.contains("sercom2"));
    }
}
