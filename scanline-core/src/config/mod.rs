//! Configuration types
//!
//! Board configuration, stored in flash either as TOML text or as
//! postcard-serialized binary data.

pub mod types;

pub use types::*;
