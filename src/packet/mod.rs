//! CFA635 wire packet codec.
//!
//! Implements the binary frame format used by the module firmware:
//! a one-byte command, a one-byte payload length, up to 255 payload bytes,
//! and a little-endian CRC-16/X-25 over everything before it.

mod codec;
mod crc;
pub mod opcodes;


// Re-export public API
pub use codec::{MAX_DATA_LEN, Packet, PacketError};
pub use crc::crc16;
