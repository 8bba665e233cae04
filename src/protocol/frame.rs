//! # Frame Layout and Builder
//!
//! Every frame on the radio channel is a 3-byte header followed by the payload:
//!
//! ```text
//! +--------+-----------+--------+------------------+
//! | sender | recipient | length | payload[length]  |
//! +--------+-----------+--------+------------------+
//!    1 B       1 B        1 B      0..=255 B
//! ```
//!
//! There is no sync byte and no checksum. Integrity relies on the length field.

use crate::error::{RelayError, Result};

/// 8-bit node address
pub type Address = u8;

/// Recipient address meaning "the base station"
pub const BROADCAST: Address = 0xFF;

/// Header size: sender(1) + recipient(1) + length(1)
pub const HEADER_SIZE: usize = 3;

/// Maximum payload size representable by the one-byte length field
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;

/// Maximum encoded frame size (header + payload)
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE;

/// A single addressed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Originating node address
    pub sender: Address,

    /// Destination node address, or [`BROADCAST`]
    pub recipient: Address,

    /// Declared payload byte count
    pub length: u8,

    /// Payload data
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a new frame
    ///
    /// # Arguments
    ///
    /// * `sender` - Address of the transmitting node
    /// * `recipient` - Destination address ([`BROADCAST`] for the base station)
    /// * `payload` - Payload data (max 255 bytes)
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::PayloadTooLarge`] if the payload exceeds
    /// [`MAX_PAYLOAD_SIZE`]. The payload is never truncated.
    ///
    /// # Examples
    ///
    /// ```
    /// use imu_relay::protocol::frame::{Frame, BROADCAST};
    ///
    /// let frame = Frame::new(0x02, BROADCAST, b"hello".to_vec()).unwrap();
    /// assert_eq!(frame.to_bytes(), vec![0x02, 0xFF, 5, b'h', b'e', b'l', b'l', b'o']);
    /// ```
    pub fn new(sender: Address, recipient: Address, payload: Vec<u8>) -> Result<Self> {
        let length = u8::try_from(payload.len()).map_err(|_| RelayError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        })?;

        Ok(Self {
            sender,
            recipient,
            length,
            payload,
        })
    }

    /// Whether the frame is addressed to `address` directly or broadcast
    pub fn is_for(&self, address: Address) -> bool {
        self.recipient == address || self.recipient == BROADCAST
    }

    /// Whether the captured payload matches the declared length
    pub fn is_consistent(&self) -> bool {
        self.payload.len() == self.length as usize
    }

    /// Encoded size on the wire
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Serialize to `[sender][recipient][length][payload...]`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.wire_len());
        bytes.push(self.sender);
        bytes.push(self.recipient);
        bytes.push(self.length);
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}

/// Decode a buffer holding exactly one complete frame
///
/// # Errors
///
/// Returns error if:
/// - The buffer is shorter than the header
/// - Fewer than `length` payload bytes follow the header
/// - Bytes remain after the payload
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    if bytes.len() < HEADER_SIZE {
        return Err(RelayError::Protocol(format!(
            "Frame too short: {} bytes, header needs {}",
            bytes.len(),
            HEADER_SIZE
        )));
    }

    let length = bytes[2] as usize;
    let expected = HEADER_SIZE + length;

    if bytes.len() < expected {
        return Err(RelayError::Protocol(format!(
            "Frame truncated: expected {} bytes, got {}",
            expected,
            bytes.len()
        )));
    }

    if bytes.len() > expected {
        return Err(RelayError::Protocol(format!(
            "{} trailing bytes after frame",
            bytes.len() - expected
        )));
    }

    Frame::new(bytes[0], bytes[1], bytes[HEADER_SIZE..].to_vec())
}
