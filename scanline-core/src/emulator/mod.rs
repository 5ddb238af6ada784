//! Emulation glue
//!
//! The cooperative loop that advances the emulator and feeds it timing
//! ticks and input.

pub mod glue;
pub mod ticks;

pub use glue::{GlueLoop, Iteration};
pub use ticks::{Periodic, ONE_HZ_PERIOD_US, VSYNC_PERIOD_US};
