//! Embassy async tasks
//!
//! All of these run on core 1; core 0 belongs to the emulator loop.

pub mod bridge_link;
pub mod bridge_rx;
pub mod led;

pub use bridge_link::bridge_link_task;
pub use bridge_rx::bridge_rx_task;
pub use led::led_task;
