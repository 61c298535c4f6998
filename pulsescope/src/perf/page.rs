//! Seqlock read protocol over a counter control page
//!
//! The kernel updates the control page whenever it reschedules a counter
//! (context switch, multiplexing rotation). Readers never block it; instead
//! they detect torn reads through the `lock` generation counter and retry.
//!
//! The protocol is kept generic over [`CounterPage`] so tests can drive it
//! with a fake page that mutates mid-read.

use std::sync::atomic::{fence, Ordering};

/// View of the fields the seqlock read protocol needs from a control page.
///
/// Implementations must return freshly loaded values on every call; caching
/// a field across calls would defeat torn-read detection.
pub trait CounterPage {
    /// Seqlock generation count (`lock` in the kernel page)
    fn seq(&self) -> u32;

    /// Accumulated count excluding the live register
    fn offset(&self) -> i64;

    /// Hardware slot + 1 when scheduled, 0 when the counter is not on a PMU
    fn index(&self) -> u32;

    /// Read the physical counter register for `slot`
    fn read_pmc(&self, slot: u32) -> u64;
}

/// Read one torn-free counter value from `page`.
///
/// Each attempt loads the generation count, then the accumulated offset and
/// the hardware index. A nonzero index means the counter is live on a PMU
/// slot, so the register contents are added to the offset; index zero means
/// the offset alone is authoritative (counter currently unscheduled). The
/// generation count is then reloaded; a mismatch means the kernel mutated
/// the page mid-read and the attempt is discarded.
///
/// The value is monotonic within one session of the counter and wraps at
/// the hardware counter width; no width adjustment happens here.
#[allow(clippy::cast_sign_loss)]
pub fn read_counter<P: CounterPage + ?Sized>(page: &P) -> u64 {
    loop {
        let seq = page.seq();
        // Orders the field loads after the generation load
        fence(Ordering::Acquire);

        let mut value = page.offset() as u64;
        let index = page.index();
        if index != 0 {
            value = value.wrapping_add(page.read_pmc(index - 1));
        }

        // Orders the re-check after the field loads
        fence(Ordering::Acquire);
        if page.seq() == seq {
            return value;
        }
    }
}
