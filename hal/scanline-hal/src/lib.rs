//! Scanline Hardware Abstraction Layer
//!
//! Traits implemented by the chip HAL and consumed by the firmware. Only
//! persistent storage needs a seam today; video and DMA are too chip
//! specific to abstract usefully.
//!
//! - [`flash::FlashStorage`] - Persistent key/value storage

#![no_std]
#![deny(unsafe_code)]

pub mod flash;

pub use flash::{FlashError, FlashStorage, StorageKey};
