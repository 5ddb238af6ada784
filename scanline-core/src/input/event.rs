//! Normalized input events

use crate::input::keymap::MacKey;

/// Device-agnostic input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    /// Key transition on the emulated keyboard
    Key { key: MacKey, pressed: bool },
    /// Relative pointer movement with the current button level
    Pointer { dx: i32, dy: i32, button: bool },
}

impl InputEvent {
    pub fn key(key: MacKey, pressed: bool) -> Self {
        InputEvent::Key { key, pressed }
    }

    pub fn is_key(&self) -> bool {
        matches!(self, InputEvent::Key { .. })
    }
}
