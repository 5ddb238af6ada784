//! Message types for the bridge protocol
//!
//! - Bridge → firmware: HID reports, device hotplug, heartbeat requests
//! - Firmware → bridge: heartbeat responses

use crate::frame::{Frame, FrameError};
use crate::reports::{KeyboardReport, MouseReport};

// Message type IDs: Bridge → Firmware
pub const MSG_KEYBOARD: u8 = 0x01;
pub const MSG_MOUSE: u8 = 0x02;
pub const MSG_ATTACHED: u8 = 0x03;
pub const MSG_DETACHED: u8 = 0x04;
pub const MSG_PING: u8 = 0x05;

// Message type IDs: Firmware → Bridge
pub const MSG_PONG: u8 = 0x20;

/// Errors decoding a frame into a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    UnknownType(u8),
    BadLength { expected: u8, actual: u8 },
    UnknownDevice(u8),
    Frame(FrameError),
}

impl From<FrameError> for MessageError {
    fn from(e: FrameError) -> Self {
        MessageError::Frame(e)
    }
}

/// HID boot interface protocol of a hotplugged device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceKind {
    Keyboard,
    Mouse,
}

impl DeviceKind {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(DeviceKind::Keyboard),
            2 => Some(DeviceKind::Mouse),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            DeviceKind::Keyboard => 1,
            DeviceKind::Mouse => 2,
        }
    }
}

/// Messages from the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeMessage {
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
    Attached { kind: DeviceKind },
    Detached { kind: DeviceKind },
    Ping,
}

impl BridgeMessage {
    pub fn from_frame(frame: &Frame) -> Result<Self, MessageError> {
        let payload = frame.payload.as_slice();
        match frame.msg_type {
            MSG_KEYBOARD => KeyboardReport::from_bytes(payload).map(BridgeMessage::Keyboard),
            MSG_MOUSE => MouseReport::from_bytes(payload).map(BridgeMessage::Mouse),
            MSG_ATTACHED => device_kind(payload).map(|kind| BridgeMessage::Attached { kind }),
            MSG_DETACHED => device_kind(payload).map(|kind| BridgeMessage::Detached { kind }),
            MSG_PING => Ok(BridgeMessage::Ping),
            other => Err(MessageError::UnknownType(other)),
        }
    }

    /// Encode this message into a frame (for testing or simulation)
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            BridgeMessage::Keyboard(report) => Frame::new(MSG_KEYBOARD, &report.to_bytes()),
            BridgeMessage::Mouse(report) => Frame::new(MSG_MOUSE, &report.to_bytes()),
            BridgeMessage::Attached { kind } => Frame::new(MSG_ATTACHED, &[kind.to_byte()]),
            BridgeMessage::Detached { kind } => Frame::new(MSG_DETACHED, &[kind.to_byte()]),
            BridgeMessage::Ping => Ok(Frame::empty(MSG_PING)),
        }
    }
}

fn device_kind(payload: &[u8]) -> Result<DeviceKind, MessageError> {
    match payload {
        [byte] => DeviceKind::from_byte(*byte).ok_or(MessageError::UnknownDevice(*byte)),
        _ => Err(MessageError::BadLength {
            expected: 1,
            actual: payload.len() as u8,
        }),
    }
}

/// Messages from the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FirmwareMessage {
    /// Heartbeat response
    Pong,
}

impl FirmwareMessage {
    pub fn to_frame(&self) -> Frame {
        match self {
            FirmwareMessage::Pong => Frame::empty(MSG_PONG),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameParser;
    use proptest::prelude::*;

    #[test]
    fn test_keyboard_message() {
        let frame = Frame::new(MSG_KEYBOARD, &[0x01, 0, 0x04, 0, 0, 0, 0, 0]).unwrap();
        let msg = BridgeMessage::from_frame(&frame).unwrap();
        assert_eq!(
            msg,
            BridgeMessage::Keyboard(KeyboardReport {
                modifiers: 0x01,
                keys: [0x04, 0, 0, 0, 0, 0],
            })
        );
    }

    #[test]
    fn test_mouse_message() {
        let frame = Frame::new(MSG_MOUSE, &[0x01, 0x02, 0xFE]).unwrap();
        let msg = BridgeMessage::from_frame(&frame).unwrap();
        assert_eq!(
            msg,
            BridgeMessage::Mouse(MouseReport {
                buttons: 1,
                dx: 2,
                dy: -2,
                wheel: 0
            })
        );
    }

    #[test]
    fn test_hotplug_messages() {
        let frame = Frame::new(MSG_DETACHED, &[1]).unwrap();
        assert_eq!(
            BridgeMessage::from_frame(&frame),
            Ok(BridgeMessage::Detached {
                kind: DeviceKind::Keyboard
            })
        );

        let frame = Frame::new(MSG_ATTACHED, &[9]).unwrap();
        assert_eq!(
            BridgeMessage::from_frame(&frame),
            Err(MessageError::UnknownDevice(9))
        );
    }

    #[test]
    fn test_ping_and_unknown() {
        assert_eq!(
            BridgeMessage::from_frame(&Frame::empty(MSG_PING)),
            Ok(BridgeMessage::Ping)
        );
        assert_eq!(
            BridgeMessage::from_frame(&Frame::empty(0x42)),
            Err(MessageError::UnknownType(0x42))
        );
    }

    #[test]
    fn test_pong_frame() {
        let frame = FirmwareMessage::Pong.to_frame();
        assert_eq!(frame.msg_type, MSG_PONG);
        assert!(frame.payload.is_empty());
    }

    proptest! {
        #[test]
        fn prop_mouse_over_the_wire(buttons in any::<u8>(), dx in any::<i8>(), dy in any::<i8>(), wheel in any::<i8>()) {
            let msg = BridgeMessage::Mouse(MouseReport { buttons, dx, dy, wheel });
            let bytes = msg.to_frame().unwrap().encode_to_vec().unwrap();
            let mut parser = FrameParser::new();
            let frame = parser.feed_bytes(&bytes).unwrap().unwrap();
            prop_assert_eq!(BridgeMessage::from_frame(&frame).unwrap(), msg);
        }
    }
}
