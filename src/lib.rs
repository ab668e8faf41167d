//! # sercom-serial
//!
//! Pin-multiplexed SERCOM resolver and interrupt-driven buffered USART
//! transport for SAMD21 / SAMx5 parts.
//!
//! ## Architecture
//!
//! ```text
//! pins (pad tables) ──▶ SercomBus ──▶ SercomTarget (registers)
//!                        │  registry   ▲
//!                        │  dispatch   │ on_interrupt()
//!                        └─ usart ─────┘
//! ```
//!
//! - Foreground and the SERCOM interrupt share state only through
//!   single-producer / single-consumer rings and atomics.
//! - Configuration errors are values in the core and fatal in
//!   [`commands`].
//! - Register encodings stay behind [`SercomTarget`].

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
pub mod pins;
pub mod registry;
pub mod target;
pub mod ring;
pub mod fault;
pub mod logging;
pub mod log_drain;
pub mod dispatch;
pub mod sercom;
pub mod usart;
pub mod pwm;
pub mod commands;

pub use config::{BusConfig, Variant, MAX_SERCOMS};
pub use error::ConfigError;
pub use pins::{Pin, PinFunction, PinRole};
pub use registry::InstanceId;
pub use target::{Baud, ClockId, IntFlags, SercomTarget, TimerId, UsartFrame};
pub use ring::RingBuffer;
pub use fault::{FaultCode, FaultSnapshot, FaultState};
pub use sercom::{PadMode, SercomBus, UsartHandle, UsartMode};
pub use usart::SerialPort;
pub use pwm::{PwmChannel, MAX_PWM};
pub use commands::UsartCommands;
