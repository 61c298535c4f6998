//! Structured error types for pulsescope
//!
//! Using thiserror for automatic Display implementation and error chaining.
//!
//! Note that `HwCounter` construction deliberately has no error type: a
//! failed open yields an inactive handle, mirroring the kernel API where
//! partial setup must collapse both resources together. These errors cover
//! the surrounding plumbing (preflight, CLI, collector setup, export).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CounterError {
    #[error(
        "failed to open hardware counter for event '{event}' on {target}\n\n\
         Check `pulsescope` preflight output: perf_event_paranoid may be too \
         restrictive, or the event may not exist on this CPU."
    )]
    OpenFailed { event: String, target: String },

    #[error("unknown hardware event '{0}' (try: cycles, instructions, cache-misses, branch-misses)")]
    UnknownEvent(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("failed to bind listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize samples: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
