//! Keypad event and state types.

use std::fmt;

/// One of the six physical keys on the module face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Exit,
}

/// An unsolicited key activity report (codes 1-12 on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEvent {
    UpPress,
    DownPress,
    LeftPress,
    RightPress,
    EnterPress,
    ExitPress,
    UpRelease,
    DownRelease,
    LeftRelease,
    RightRelease,
    EnterRelease,
    ExitRelease,
}

impl KeyEvent {
    /// Decode a wire event code. Codes outside 1-12 are not valid reports.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::UpPress),
            2 => Some(Self::DownPress),
            3 => Some(Self::LeftPress),
            4 => Some(Self::RightPress),
            5 => Some(Self::EnterPress),
            6 => Some(Self::ExitPress),
            7 => Some(Self::UpRelease),
            8 => Some(Self::DownRelease),
            9 => Some(Self::LeftRelease),
            10 => Some(Self::RightRelease),
            11 => Some(Self::EnterRelease),
            12 => Some(Self::ExitRelease),
            _ => None,
        }
    }

    /// Wire event code (1-12).
    pub fn code(self) -> u8 {
        match self {
            Self::UpPress => 1,
            Self::DownPress => 2,
            Self::LeftPress => 3,
            Self::RightPress => 4,
            Self::EnterPress => 5,
            Self::ExitPress => 6,
            Self::UpRelease => 7,
            Self::DownRelease => 8,
            Self::LeftRelease => 9,
            Self::RightRelease => 10,
            Self::EnterRelease => 11,
            Self::ExitRelease => 12,
        }
    }

    /// Which key the event refers to.
    pub fn key(self) -> Key {
        match self {
            Self::UpPress | Self::UpRelease => Key::Up,
            Self::DownPress | Self::DownRelease => Key::Down,
            Self::LeftPress | Self::LeftRelease => Key::Left,
            Self::RightPress | Self::RightRelease => Key::Right,
            Self::EnterPress | Self::EnterRelease => Key::Enter,
            Self::ExitPress | Self::ExitRelease => Key::Exit,
        }
    }

    /// True for press events, false for releases.
    pub fn is_press(self) -> bool {
        self.code() <= 6
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.is_press() { "press" } else { "release" };
        write!(f, "{:?} {action}", self.key())
    }
}

/// Bit set of currently held keys, as returned by the poll-keys command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyMask(u8);

impl KeyMask {
    pub const UP: u8 = 0x01;
    pub const ENTER: u8 = 0x02;
    pub const CANCEL: u8 = 0x04;
    pub const LEFT: u8 = 0x08;
    pub const RIGHT: u8 = 0x10;
    pub const DOWN: u8 = 0x20;

    /// Wrap a raw mask byte from the device.
    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw mask byte.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// No key is held.
    pub fn is_empty(self) -> bool {
        self.0 & 0x3F == 0
    }

    pub fn up(self) -> bool {
        self.0 & Self::UP != 0
    }

    pub fn enter(self) -> bool {
        self.0 & Self::ENTER != 0
    }

    pub fn cancel(self) -> bool {
        self.0 & Self::CANCEL != 0
    }

    pub fn left(self) -> bool {
        self.0 & Self::LEFT != 0
    }

    pub fn right(self) -> bool {
        self.0 & Self::RIGHT != 0
    }

    pub fn down(self) -> bool {
        self.0 & Self::DOWN != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_codes_round_trip() {
        for code in 1..=12 {
            let event = KeyEvent::from_code(code).unwrap();
            assert_eq!(event.code(), code);
        }
    }

    #[test]
    fn test_invalid_event_codes() {
        assert_eq!(KeyEvent::from_code(0), None);
        assert_eq!(KeyEvent::from_code(13), None);
        assert_eq!(KeyEvent::from_code(0xFF), None);
    }

    #[test]
    fn test_press_release_split() {
        assert!(KeyEvent::EnterPress.is_press());
        assert!(!KeyEvent::EnterRelease.is_press());
        assert_eq!(KeyEvent::EnterPress.key(), Key::Enter);
        assert_eq!(KeyEvent::EnterRelease.key(), Key::Enter);
    }

    #[test]
    fn test_key_mask_bits() {
        let mask = KeyMask::from_bits(KeyMask::UP | KeyMask::DOWN);
        assert!(mask.up());
        assert!(mask.down());
        assert!(!mask.enter());
        assert!(!mask.cancel());
        assert!(!mask.is_empty());
        assert!(KeyMask::default().is_empty());
    }
}
