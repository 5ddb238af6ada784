//! HID usage to emulated keyboard mapping
//!
//! Raw key codes follow the classic Macintosh virtual key numbering. The
//! emulator expects them shifted left by one with bit 0 set, see
//! [`MacKey::code`].

/// Raw key code on the emulated keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MacKey {
    A = 0x00,
    S = 0x01,
    D = 0x02,
    F = 0x03,
    H = 0x04,
    G = 0x05,
    Z = 0x06,
    X = 0x07,
    C = 0x08,
    V = 0x09,
    B = 0x0B,
    Q = 0x0C,
    W = 0x0D,
    E = 0x0E,
    R = 0x0F,
    Y = 0x10,
    T = 0x11,
    Num1 = 0x12,
    Num2 = 0x13,
    Num3 = 0x14,
    Num4 = 0x15,
    Num6 = 0x16,
    Num5 = 0x17,
    Equal = 0x18,
    Num9 = 0x19,
    Num7 = 0x1A,
    Minus = 0x1B,
    Num8 = 0x1C,
    Num0 = 0x1D,
    RightBracket = 0x1E,
    O = 0x1F,
    U = 0x20,
    LeftBracket = 0x21,
    I = 0x22,
    P = 0x23,
    Return = 0x24,
    L = 0x25,
    J = 0x26,
    Quote = 0x27,
    K = 0x28,
    Semicolon = 0x29,
    Backslash = 0x2A,
    Comma = 0x2B,
    Slash = 0x2C,
    N = 0x2D,
    M = 0x2E,
    Period = 0x2F,
    Tab = 0x30,
    Space = 0x31,
    Grave = 0x32,
    Backspace = 0x33,
    Escape = 0x35,
    Command = 0x37,
    Shift = 0x38,
    CapsLock = 0x39,
    Option = 0x3A,
    Control = 0x3B,
    KpDecimal = 0x41,
    KpMultiply = 0x43,
    KpAdd = 0x45,
    KpDivide = 0x4B,
    Enter = 0x4C,
    KpSubtract = 0x4E,
    Kp0 = 0x52,
    Kp1 = 0x53,
    Kp2 = 0x54,
    Kp3 = 0x55,
    Kp4 = 0x56,
    Kp5 = 0x57,
    Kp6 = 0x58,
    Kp7 = 0x59,
    Kp8 = 0x5B,
    Kp9 = 0x5C,
    F5 = 0x60,
    F6 = 0x61,
    F7 = 0x62,
    F3 = 0x63,
    F8 = 0x64,
    F9 = 0x65,
    F11 = 0x67,
    Print = 0x69,
    ScrollLock = 0x6B,
    F10 = 0x6D,
    F12 = 0x6F,
    Pause = 0x71,
    Help = 0x72,
    Home = 0x73,
    PageUp = 0x74,
    F4 = 0x76,
    End = 0x77,
    F2 = 0x78,
    PageDown = 0x79,
    F1 = 0x7A,
    Left = 0x7B,
    Right = 0x7C,
    Down = 0x7D,
    Up = 0x7E,
}

impl MacKey {
    /// Raw 7-bit key number
    pub fn raw(self) -> u8 {
        self as u8
    }

    /// Logical code as delivered to the emulator
    pub fn code(self) -> u8 {
        (self.raw() << 1) | 1
    }
}

/// HID modifier bit positions after left/right coalescing
pub const MOD_CONTROL: u8 = 0x01;
pub const MOD_SHIFT: u8 = 0x02;
pub const MOD_ALT: u8 = 0x04;
pub const MOD_GUI: u8 = 0x08;

/// First modifier usage on the keyboard page (left control)
pub const USAGE_MODIFIER_BASE: u8 = 0xE0;

/// Map a keyboard page usage to an emulated key
///
/// Returns `None` for usages the emulated keyboard has no key for.
pub fn map_usage(usage: u8) -> Option<MacKey> {
    use MacKey::*;

    let key = match usage {
        0x04 => A,
        0x05 => B,
        0x06 => C,
        0x07 => D,
        0x08 => E,
        0x09 => F,
        0x0A => G,
        0x0B => H,
        0x0C => I,
        0x0D => J,
        0x0E => K,
        0x0F => L,
        0x10 => M,
        0x11 => N,
        0x12 => O,
        0x13 => P,
        0x14 => Q,
        0x15 => R,
        0x16 => S,
        0x17 => T,
        0x18 => U,
        0x19 => V,
        0x1A => W,
        0x1B => X,
        0x1C => Y,
        0x1D => Z,
        0x1E => Num1,
        0x1F => Num2,
        0x20 => Num3,
        0x21 => Num4,
        0x22 => Num5,
        0x23 => Num6,
        0x24 => Num7,
        0x25 => Num8,
        0x26 => Num9,
        0x27 => Num0,
        0x28 => Return,
        0x29 => Escape,
        0x2A => Backspace,
        0x2B => Tab,
        0x2C => Space,
        0x2D => Minus,
        0x2E => Equal,
        0x2F => LeftBracket,
        0x30 => RightBracket,
        0x31 => Backslash,
        0x33 => Semicolon,
        0x34 => Quote,
        0x35 => Grave,
        0x36 => Comma,
        0x37 => Period,
        0x38 => Slash,
        0x39 => CapsLock,
        0x3A => F1,
        0x3B => F2,
        0x3C => F3,
        0x3D => F4,
        0x3E => F5,
        0x3F => F6,
        0x40 => F7,
        0x41 => F8,
        0x42 => F9,
        0x43 => F10,
        0x44 => F11,
        0x45 => F12,
        0x46 => Print,
        0x47 => ScrollLock,
        0x48 => Pause,
        // No insert key; Help sits in the same place
        0x49 => Help,
        0x4A => Home,
        0x4B => PageUp,
        0x4C => Backspace,
        0x4D => End,
        0x4E => PageDown,
        0x4F => Right,
        0x50 => Left,
        0x51 => Down,
        0x52 => Up,
        0x54 => KpDivide,
        0x55 => KpMultiply,
        0x56 => KpSubtract,
        0x57 => KpAdd,
        0x58 => Enter,
        0x59 => Kp1,
        0x5A => Kp2,
        0x5B => Kp3,
        0x5C => Kp4,
        0x5D => Kp5,
        0x5E => Kp6,
        0x5F => Kp7,
        0x60 => Kp8,
        0x61 => Kp9,
        0x62 => Kp0,
        0x63 => KpDecimal,
        0x67 => Equal,
        0x9E => Return,
        0xE0 | 0xE4 => Control,
        0xE1 | 0xE5 => Shift,
        0xE2 | 0xE6 => Option,
        0xE3 | 0xE7 => Command,
        _ => return None,
    };
    Some(key)
}
