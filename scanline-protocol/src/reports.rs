//! HID boot protocol reports

use crate::messages::MessageError;

/// Boot keyboard report length on the wire
pub const KEYBOARD_REPORT_LEN: usize = 8;

/// Key slots in a boot keyboard report
pub const KEY_SLOTS: usize = 6;

/// Boot keyboard report: modifier bits and up to six held usages
///
/// Modifier bits 0..3 are left control, shift, alt and GUI; bits 4..7 the
/// right-hand ones. Empty key slots are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub keys: [u8; KEY_SLOTS],
}

impl KeyboardReport {
    /// Decode `[modifiers, reserved, key0..key5]`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        if bytes.len() != KEYBOARD_REPORT_LEN {
            return Err(MessageError::BadLength {
                expected: KEYBOARD_REPORT_LEN as u8,
                actual: bytes.len() as u8,
            });
        }
        let mut keys = [0u8; KEY_SLOTS];
        keys.copy_from_slice(&bytes[2..]);
        Ok(Self {
            modifiers: bytes[0],
            keys,
        })
    }

    pub fn to_bytes(&self) -> [u8; KEYBOARD_REPORT_LEN] {
        let mut out = [0u8; KEYBOARD_REPORT_LEN];
        out[0] = self.modifiers;
        out[2..].copy_from_slice(&self.keys);
        out
    }

    /// True if `usage` is in one of the key slots
    pub fn holds(&self, usage: u8) -> bool {
        usage != 0 && self.keys.contains(&usage)
    }
}

/// Boot mouse report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    /// Button bits, bit 0 is the left button
    pub buttons: u8,
    pub dx: i8,
    pub dy: i8,
    pub wheel: i8,
}

impl MouseReport {
    /// Decode `[buttons, dx, dy]` with an optional trailing wheel byte
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        match bytes {
            [buttons, dx, dy] => Ok(Self {
                buttons: *buttons,
                dx: *dx as i8,
                dy: *dy as i8,
                wheel: 0,
            }),
            [buttons, dx, dy, wheel] => Ok(Self {
                buttons: *buttons,
                dx: *dx as i8,
                dy: *dy as i8,
                wheel: *wheel as i8,
            }),
            _ => Err(MessageError::BadLength {
                expected: 3,
                actual: bytes.len() as u8,
            }),
        }
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        [
            self.buttons,
            self.dx as u8,
            self.dy as u8,
            self.wheel as u8,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_report_skips_reserved() {
        let report = KeyboardReport::from_bytes(&[0x02, 0xAA, 0x04, 0x05, 0, 0, 0, 0]).unwrap();
        assert_eq!(report.modifiers, 0x02);
        assert_eq!(report.keys, [0x04, 0x05, 0, 0, 0, 0]);
        assert_eq!(report.to_bytes()[1], 0);
    }

    #[test]
    fn test_keyboard_report_length() {
        assert_eq!(
            KeyboardReport::from_bytes(&[0; 7]),
            Err(MessageError::BadLength {
                expected: 8,
                actual: 7
            })
        );
    }

    #[test]
    fn test_holds_ignores_empty_slots() {
        let report = KeyboardReport {
            modifiers: 0,
            keys: [0x04, 0, 0, 0, 0, 0],
        };
        assert!(report.holds(0x04));
        assert!(!report.holds(0x05));
        assert!(!report.holds(0));
    }

    #[test]
    fn test_mouse_report_signed_deltas() {
        let report = MouseReport::from_bytes(&[0x01, 0xFF, 0x80]).unwrap();
        assert_eq!(report.buttons, 0x01);
        assert_eq!(report.dx, -1);
        assert_eq!(report.dy, -128);
        assert_eq!(report.wheel, 0);
    }

    #[test]
    fn test_mouse_report_with_wheel() {
        let report = MouseReport::from_bytes(&[0, 3, 4, 0xFE]).unwrap();
        assert_eq!(report.wheel, -2);
    }

    #[test]
    fn test_mouse_report_length() {
        assert!(MouseReport::from_bytes(&[0, 1]).is_err());
        assert!(MouseReport::from_bytes(&[0, 1, 2, 3, 4]).is_err());
    }
}
