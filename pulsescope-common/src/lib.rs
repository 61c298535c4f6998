//! # Shared Layout-Stable Definitions (Kernel ABI + Wire Contract)
//!
//! Definitions that must agree byte-for-byte with something outside this
//! process:
//!
//! - [`perf`] mirrors the Linux `perf_event` ABI: the attribute block passed
//!   to `perf_event_open(2)` and the control page the kernel maps into user
//!   space. All types are `#[repr(C)]`; field order and widths follow
//!   `<linux/perf_event.h>`.
//! - [`wire`] fixes the frame contract spoken between a probe and a
//!   collector: an 8-byte big-endian length prefix followed by the payload.
//!
//! The crate is `no_std` so probe-side code with no runtime can depend on it.

#![no_std]

pub mod perf;
pub mod wire;
