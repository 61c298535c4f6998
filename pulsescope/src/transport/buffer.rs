//! Fixed-capacity accumulation buffer for partial reads
//!
//! Backed by `bytes::BytesMut` so a completed payload is handed off without
//! copying. The capacity is a hard ceiling: the framer never asks the buffer
//! to grow past it, which is what bounds the legal frame size.

use std::io::{self, Read};

use bytes::{Bytes, BytesMut};

/// Growable-up-to-a-ceiling byte storage the framer accumulates into.
#[derive(Debug)]
pub struct FrameBuffer {
    buf: BytesMut,
    capacity: usize,
}

impl FrameBuffer {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: BytesMut::with_capacity(capacity), capacity }
    }

    /// Discard all buffered bytes.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Append at most `want` bytes from `reader` in a single read call.
    ///
    /// A single call deliberately never issues more than one read, so the
    /// caller observes exactly the source's delivery granularity and never
    /// consumes bytes beyond the current frame phase.
    ///
    /// # Errors
    /// Propagates the reader's error untouched; the buffer is unchanged in
    /// that case.
    ///
    /// # Panics
    /// Panics if `want` would push the buffer past its capacity; the framer
    /// validates declared lengths before asking.
    pub fn fill_from<R: Read>(&mut self, reader: &mut R, want: usize) -> io::Result<usize> {
        assert!(
            self.buf.len() + want <= self.capacity,
            "fill_from past buffer capacity ({} + {want} > {})",
            self.buf.len(),
            self.capacity,
        );
        let start = self.buf.len();
        self.buf.resize(start + want, 0);
        match reader.read(&mut self.buf[start..]) {
            Ok(n) => {
                self.buf.truncate(start + n);
                Ok(n)
            }
            Err(e) => {
                self.buf.truncate(start);
                Err(e)
            }
        }
    }

    /// Hand off everything buffered as an immutable payload, leaving the
    /// buffer empty.
    pub fn take(&mut self) -> Bytes {
        self.buf.split().freeze()
    }
}
