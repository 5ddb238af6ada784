//! Input bridge link health

pub mod monitor;

pub use monitor::{LinkMonitor, LinkStatus, DEFAULT_LINK_TIMEOUT_MS};
