//! # pulsescope - Low-Latency PMU Counter Sampling and Frame Collection
//!
//! pulsescope is the core of a low-latency profiling toolkit. It carries two
//! independent subsystems:
//!
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │        Probe Side            │   │       Collector Side         │
//! │                              │   │                              │
//! │  ┌────────────────────────┐  │   │  ┌────────────────────────┐  │
//! │  │ HwCounter (perf)       │  │   │  │ Framer (transport)     │  │
//! │  │ • perf_event_open      │  │   │  │ • header/body cursor   │  │
//! │  │ • mapped control page  │  │   │  │ • partial-read resume  │  │
//! │  │ • seqlock + rdpmc read │  │   │  │ • disconnect handling  │  │
//! │  └───────────┬────────────┘  │   │  └───────────┬────────────┘  │
//! │              │ samples       │   │              │ frames        │
//! │              ▼               │   │              ▼               │
//! │  ┌────────────────────────┐  │   │  ┌────────────────────────┐  │
//! │  │ SampleExporter (JSON)  │  │   │  │ Caller (session layer) │  │
//! │  └────────────────────────┘  │   │  └────────────────────────┘  │
//! └──────────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`perf`]: hardware counter access through the kernel's mapped control
//!   page, read lock-free with a seqlock retry loop
//! - [`transport`]: streaming frame decoder turning a byte stream into
//!   discrete length-prefixed messages
//! - [`export`]: JSON export of collected counter samples
//! - [`preflight`]: environment checks run before opening counters
//! - [`domain`]: id newtypes and structured errors
//! - [`cli`]: command-line argument definitions
//!
//! Neither subsystem spawns threads or takes locks. `HwCounter::read` is
//! lock-free against the kernel as the single concurrent writer; `Framer`
//! is synchronous and driven by exactly one caller at a time.

pub mod cli;
pub mod domain;
pub mod export;
pub mod perf;
pub mod preflight;
pub mod transport;
