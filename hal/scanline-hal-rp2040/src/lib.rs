//! RP2040-specific HAL for the Scanline firmware
//!
//! - PIO video program and state machine setup
//! - Three-channel DMA line chain and its line interrupt
//! - Flash storage driver (implements `scanline_hal::FlashStorage`)
//! - Flash-backed emulator disk

#![no_std]

pub mod flash;
pub mod pio;
pub mod scanout;
pub mod slot;

pub use scanline_hal::{FlashStorage as FlashStorageTrait, StorageKey};
