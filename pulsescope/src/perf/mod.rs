//! Hardware performance counter access
//!
//! A [`HwCounter`] owns one perf event descriptor and the control page the
//! kernel maps alongside it. Counter values are read lock-free through the
//! page using a seqlock retry loop, so the hot path costs a handful of loads
//! and (when the counter is scheduled) one `rdpmc` — no syscall.
//!
//! - `event`: hardware event selection and `perf_event_attr` construction
//! - `page`: the seqlock read protocol over an abstract counter page
//! - `counter`: descriptor + page ownership, open/enable/read/drop

pub mod counter;
pub mod event;
pub mod page;

pub use counter::HwCounter;
pub use event::{EventSpec, HardwareEvent};
pub use page::{read_counter, CounterPage};
