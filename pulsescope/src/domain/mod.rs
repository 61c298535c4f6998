//! Domain model for pulsescope
//!
//! Id newtypes (compile-time safety via the newtype pattern) and structured
//! errors for the probe and collector paths.

pub mod errors;
pub mod types;

pub use errors::{CollectorError, CounterError};
pub use types::Tid;
