//! HID bridge protocol
//!
//! A USB-host bridge owns the keyboard and mouse and forwards their boot
//! protocol reports to the Scanline firmware over UART. The firmware only
//! answers heartbeats.
//!
//! # Frame format
//!
//! ```text
//! ┌──────┬──────┬─────┬─────────────┬──────────┐
//! │ SYNC │ TYPE │ LEN │ PAYLOAD     │ CHECKSUM │
//! │ 1B   │ 1B   │ 1B  │ 0–64B       │ 1B       │
//! └──────┴──────┴─────┴─────────────┴──────────┘
//! ```
//!
//! CHECKSUM is the XOR of TYPE, LEN and every payload byte.

#![no_std]
#![deny(unsafe_code)]

pub mod frame;
pub mod messages;
pub mod reports;

pub use frame::{Frame, FrameError, FrameParser, FRAME_SYNC, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use messages::{BridgeMessage, DeviceKind, FirmwareMessage, MessageError};
pub use reports::{KeyboardReport, MouseReport};
