//! Board-agnostic core logic for the Scanline firmware
//!
//! This crate contains everything that does not touch registers:
//!
//! - Frame timing model for the fixed 640x480@60 raster
//! - Scan-out sequencer (the per-line reprogram step as a state machine)
//! - Coherency policy for framebuffers read by DMA behind the writer's back
//! - HID report translation into edge-triggered key events
//! - Lossy single-producer/single-consumer event queue
//! - Pointer accumulator shared between the input and emulator cores
//! - Emulator glue loop and its collaborator traits
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod emulator;
pub mod input;
pub mod link;
pub mod traits;
pub mod video;
