//! Streaming frame decoding
//!
//! Reconstructs discrete length-prefixed messages from a continuous byte
//! stream, tolerating partial reads and mid-stream disconnects. The wire
//! contract (8-byte big-endian length prefix, 8 KiB frame ceiling) lives in
//! `pulsescope_common::wire` so both peers share one definition.
//!
//! - `buffer`: fixed-capacity accumulation buffer
//! - `framer`: the header/body/disconnected cursor state machine

pub mod buffer;
pub mod framer;

pub use buffer::FrameBuffer;
pub use framer::{Frame, Framer};
