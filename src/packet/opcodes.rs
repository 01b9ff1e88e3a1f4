//! CFA635 opcode constants.

// Command codes
pub const CMD_PING: u8 = 0x00;
pub const CMD_GET_VERSION: u8 = 0x01;
pub const CMD_WRITE_USER_FLASH: u8 = 0x02;
pub const CMD_READ_USER_FLASH: u8 = 0x03;
pub const CMD_SAVE_BOOT_STATE: u8 = 0x04;
pub const CMD_CLEAR_SCREEN: u8 = 0x06;
pub const CMD_SET_CGRAM_GLYPH: u8 = 0x09;
pub const CMD_SET_CURSOR_POSITION: u8 = 0x0B;
pub const CMD_SET_CURSOR_STYLE: u8 = 0x0C;
pub const CMD_SET_CONTRAST: u8 = 0x0D;
pub const CMD_SET_BACKLIGHT: u8 = 0x0E;
pub const CMD_POLL_KEYS: u8 = 0x18;
pub const CMD_WRITE_TEXT: u8 = 0x1F;
pub const CMD_SET_GPIO: u8 = 0x22;

// Acknowledgements carry the request opcode with bit 6 set
pub const REPLY_FLAG: u8 = 0x40;

// Unsolicited keypad activity report: opcode 0x80, exactly one payload byte
pub const KEY_ACTIVITY_REPORT: u8 = 0x80;

/// Acknowledgement opcode for a given request opcode.
pub fn reply_opcode(command: u8) -> u8 {
    command | REPLY_FLAG
}
