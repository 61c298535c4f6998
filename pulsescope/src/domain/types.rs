//! Domain types providing compile-time safety and self-documentation

use std::fmt;

/// Thread ID
///
/// Kernel thread id of the thread a counter is attached to. `Tid(0)` is the
/// calling thread, following the `perf_event_open(2)` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tid(pub u32);

impl Tid {
    /// The calling thread
    pub const SELF: Tid = Tid(0);
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            write!(f, "TID:self")
        } else {
            write!(f, "TID:{}", self.0)
        }
    }
}

impl From<i32> for Tid {
    fn from(tid: i32) -> Self {
        #[allow(clippy::cast_sign_loss)]
        Tid(tid as u32)
    }
}
