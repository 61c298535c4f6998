//! Counter sample export
//!
//! Collects periodic counter readings and writes them out as a single JSON
//! document for external analysis (spreadsheets, jq, plotting).

use std::io::Write;

use serde::Serialize;

use crate::domain::CollectorError;

/// One periodic reading of a hardware counter.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CounterSample {
    /// Nanoseconds since sampling started
    pub timestamp_ns: u64,
    /// Accumulated counter value at this instant
    pub value: u64,
    /// Increase since the previous sample (0 for the first)
    pub delta: u64,
}

/// Accumulates samples and serializes them on demand.
pub struct SampleExporter {
    event: String,
    samples: Vec<CounterSample>,
    last_value: Option<u64>,
}

impl SampleExporter {
    #[must_use]
    pub fn new(event: impl Into<String>) -> Self {
        Self { event: event.into(), samples: Vec::new(), last_value: None }
    }

    /// Record one reading; the delta against the previous reading is
    /// computed here so consumers get it for free.
    pub fn record(&mut self, timestamp_ns: u64, value: u64) {
        let delta = self.last_value.map_or(0, |last| value.wrapping_sub(last));
        self.last_value = Some(value);
        self.samples.push(CounterSample { timestamp_ns, value, delta });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Write all collected samples as one JSON document.
    ///
    /// # Errors
    /// Returns a serialization or I/O error from the underlying writer.
    pub fn export<W: Write>(&self, writer: W) -> Result<(), CollectorError> {
        #[derive(Serialize)]
        struct Document<'a> {
            event: &'a str,
            samples: &'a [CounterSample],
        }
        serde_json::to_writer_pretty(writer, &Document { event: &self.event, samples: &self.samples })?;
        Ok(())
    }
}
