//! Packet framing and checksum validation.
//!
//! Wire frame (little-endian): `[command:1][length:1][data:length][crc:2]`
//! where the CRC covers `command ++ length ++ data`.

use super::crc::crc16;
use super::opcodes::KEY_ACTIVITY_REPORT;
use thiserror::Error;

/// Maximum payload size the length byte can describe.
pub const MAX_DATA_LEN: usize = 255;

/// Frame bytes surrounding the payload: command, length, and the two CRC bytes.
pub(crate) const FRAME_OVERHEAD: usize = 4;

/// Errors produced while encoding or decoding a wire packet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// Payload exceeds what the single length byte can describe
    #[error("payload length {0} exceeds {MAX_DATA_LEN} bytes")]
    PayloadTooLarge(usize),

    /// Input is too short to hold even an empty frame
    #[error("frame truncated: {0} bytes")]
    Truncated(usize),

    /// Declared payload length is inconsistent with the frame size
    #[error("declared payload length {declared} does not fit frame of {actual} bytes")]
    LengthMismatch { declared: usize, actual: usize },

    /// Recomputed checksum does not match the trailing bytes
    #[error("checksum mismatch: computed {computed:#06X}, received {received:#06X}")]
    ChecksumMismatch { computed: u16, received: u16 },
}

/// A validated wire packet.
///
/// The checksum is derived from `command` and `data` at construction and can
/// never be set independently; a frame that fails the check is not
/// constructible. Packets are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    command: u8,
    data: Vec<u8>,
    checksum: u16,
}

impl Packet {
    /// Build a packet from a command opcode and payload.
    pub fn new(command: u8, data: &[u8]) -> Result<Self, PacketError> {
        if data.len() > MAX_DATA_LEN {
            return Err(PacketError::PayloadTooLarge(data.len()));
        }
        Ok(Self {
            command,
            checksum: checksum_of(command, data),
            data: data.to_vec(),
        })
    }

    /// Command opcode.
    pub fn command(&self) -> u8 {
        self.command
    }

    /// Payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// CRC over command, length, and payload.
    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    /// Whether this is an unsolicited keypad activity report.
    pub fn is_key_activity(&self) -> bool {
        self.command == KEY_ACTIVITY_REPORT && self.data.len() == 1
    }

    /// Encode into wire bytes: `[command, len, data.., crc_lo, crc_hi]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.data.len() + FRAME_OVERHEAD);
        frame.push(self.command);
        frame.push(self.data.len() as u8);
        frame.extend_from_slice(&self.data);
        frame.extend_from_slice(&self.checksum.to_le_bytes());
        frame
    }

    /// Decode and validate a complete frame.
    ///
    /// Pure and total over the input slice: it never partially consumes, and
    /// rejects frames that are too short, carry an inconsistent declared
    /// length, or fail the checksum.
    pub fn decode(frame: &[u8]) -> Result<Self, PacketError> {
        if frame.len() < 2 {
            return Err(PacketError::Truncated(frame.len()));
        }
        let declared = usize::from(frame[1]);
        if frame.len() != declared + FRAME_OVERHEAD {
            return Err(PacketError::LengthMismatch {
                declared,
                actual: frame.len(),
            });
        }

        let body_end = frame.len() - 2;
        let computed = crc16(&frame[..body_end]);
        let received = u16::from_le_bytes([frame[body_end], frame[body_end + 1]]);
        if computed != received {
            return Err(PacketError::ChecksumMismatch { computed, received });
        }

        Ok(Self {
            command: frame[0],
            data: frame[2..body_end].to_vec(),
            checksum: received,
        })
    }
}

/// CRC over the length-prefixed body a frame would carry.
fn checksum_of(command: u8, data: &[u8]) -> u16 {
    let mut body = Vec::with_capacity(data.len() + 2);
    body.push(command);
    body.push(data.len() as u8);
    body.extend_from_slice(data);
    crc16(&body)
}
