//! Frame wire contract.
//!
//! Every message on the probe/collector link is one frame:
//!
//! ```text
//! ┌────────────────┬──────────────────────┐
//! │ Length         │ Payload              │
//! │ 8 bytes, u64 BE│ exactly that many    │
//! └────────────────┴──────────────────────┘
//! ```
//!
//! The length covers the payload only, not the prefix itself. Byte order is
//! network order (big-endian); both ends must use this module so the
//! contract cannot drift. Frames whose total size would exceed
//! [`FRAME_BUFFER_CAPACITY`] are illegal and force a disconnect on the
//! receiving side.

/// Size of the length prefix in bytes
pub const FRAME_HEADER_LEN: usize = 8;

/// Decoder buffer capacity; bounds the total frame size (header + payload)
pub const FRAME_BUFFER_CAPACITY: usize = 8 * 1024;

/// Largest legal payload
pub const MAX_PAYLOAD_LEN: usize = FRAME_BUFFER_CAPACITY - FRAME_HEADER_LEN;

/// Encode a payload length as a frame header.
#[must_use]
pub fn encode_frame_header(payload_len: u64) -> [u8; FRAME_HEADER_LEN] {
    payload_len.to_be_bytes()
}

/// Decode a frame header into the declared payload length.
///
/// The declared length is not validated here; callers compare it against
/// [`MAX_PAYLOAD_LEN`] before trusting it.
#[must_use]
pub fn parse_frame_header(header: &[u8; FRAME_HEADER_LEN]) -> u64 {
    u64::from_be_bytes(*header)
}
