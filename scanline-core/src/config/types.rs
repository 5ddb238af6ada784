//! Board configuration type definitions
//!
//! Pin assignments are fixed per board and live in the firmware; this is
//! everything that can change without a rebuild.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::emulator::{ONE_HZ_PERIOD_US, VSYNC_PERIOD_US};
use crate::input::DEFAULT_MAX_DELTA;
use crate::link::DEFAULT_LINK_TIMEOUT_MS;

/// Current config layout version
pub const CONFIG_VERSION: u8 = 1;

/// Allowed range for the pointer clamp
pub const POINTER_CLAMP_RANGE: core::ops::RangeInclusive<u8> = 1..=127;

/// Allowed range for the bridge UART baud rate
pub const BAUD_RANGE: core::ops::RangeInclusive<u32> = 9_600..=3_000_000;

pub const LINK_TIMEOUT_RANGE_MS: core::ops::RangeInclusive<u32> = 100..=60_000;
pub const VSYNC_PERIOD_RANGE_US: core::ops::RangeInclusive<u32> = 1_000..=100_000;
pub const SECOND_PERIOD_RANGE_US: core::ops::RangeInclusive<u32> = 100_000..=10_000_000;
pub const BLINK_RANGE_MS: core::ops::RangeInclusive<u32> = 10..=10_000;

/// Colour of raster lines outside the framebuffer window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BlankLevel {
    #[default]
    Black,
    White,
}

impl BlankLevel {
    /// Fill word for the blank line buffer
    ///
    /// Framebuffer bits are set for black pixels, and the data pad is
    /// inverted, so black is all ones.
    pub fn fill_word(self) -> u32 {
        match self {
            BlankLevel::Black => 0xFFFF_FFFF,
            BlankLevel::White => 0x0000_0000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VideoConfig {
    /// Border colour above and below the framebuffer
    pub blank: BlankLevel,
    /// Drive video pads at 12 mA instead of 4 mA
    pub high_drive: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            blank: BlankLevel::Black,
            high_drive: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InputConfig {
    /// Per-report pointer delta bound
    pub pointer_clamp: u8,
    /// Negate vertical movement before delivery
    pub invert_y: bool,
    /// Any mouse button acts as the single emulated button
    pub any_button: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            pointer_clamp: DEFAULT_MAX_DELTA,
            invert_y: true,
            any_button: false,
        }
    }
}

impl InputConfig {
    /// Report button mask that drives the emulated button
    pub fn button_mask(&self) -> u8 {
        if self.any_button {
            0x07
        } else {
            0x01
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BridgeConfig {
    pub baud: u32,
    /// Silence before the bridge is reported lost
    pub link_timeout_ms: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            baud: 115_200,
            link_timeout_ms: DEFAULT_LINK_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EmulatorConfig {
    pub vsync_period_us: u32,
    pub second_period_us: u32,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            vsync_period_us: VSYNC_PERIOD_US as u32,
            second_period_us: ONE_HZ_PERIOD_US as u32,
        }
    }
}

/// Where drive 0 comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiskSource {
    /// Writable image in the flash disk partition
    Flash,
    /// Read-only image linked into the firmware
    #[default]
    Embedded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiskConfig {
    pub source: DiskSource,
    /// Refuse writes even when the source allows them
    pub read_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusConfig {
    /// LED half-period
    pub blink_ms: u32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self { blink_ms: 500 }
    }
}

/// Complete board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoardConfig {
    pub version: u8,
    pub video: VideoConfig,
    pub input: InputConfig,
    pub bridge: BridgeConfig,
    pub emulator: EmulatorConfig,
    pub disk: DiskConfig,
    pub status: StatusConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            video: VideoConfig::default(),
            input: InputConfig::default(),
            bridge: BridgeConfig::default(),
            emulator: EmulatorConfig::default(),
            disk: DiskConfig::default(),
            status: StatusConfig::default(),
        }
    }
}

impl BoardConfig {
    pub fn new() -> Self {
        Self::default()
    }
}
