//! Counter descriptor + mapped control page ownership
//!
//! A [`HwCounter`] holds the file descriptor returned by
//! `perf_event_open(2)` and the one-page control mapping the kernel exposes
//! for it. The two are opened and released strictly together: if any setup
//! step fails both fields collapse to their sentinels and the handle simply
//! reports itself inactive. No diagnostics surface at this layer beyond a
//! debug log; callers check [`HwCounter::active`] before use.

#![allow(unsafe_code)] // syscalls and the raw kernel page require unsafe

use std::io;
use std::os::fd::RawFd;
use std::ptr;

use log::debug;
use pulsescope_common::perf::{
    PerfEventMmapPage, PERF_EVENT_IOC_DISABLE, PERF_EVENT_IOC_ENABLE, PERF_EVENT_IOC_RESET,
};

use super::event::EventSpec;
#[cfg(target_arch = "x86_64")]
use super::page::{read_counter, CounterPage};
use crate::domain::Tid;

const INVALID_FD: RawFd = -1;

fn page_len() -> usize {
    // SAFETY: sysconf with a valid name has no preconditions.
    #[allow(clippy::cast_sign_loss)]
    unsafe {
        libc::sysconf(libc::_SC_PAGESIZE) as usize
    }
}

/// Exclusive owner of one hardware counter and its kernel control page.
///
/// Move-only by construction (no `Clone`); dropping an active handle unmaps
/// the page and closes the descriptor, dropping an inactive one is a no-op.
#[derive(Debug)]
pub struct HwCounter {
    fd: RawFd,
    page: *mut PerfEventMmapPage,
    tid: Tid,
}

// SAFETY: the handle may move between threads; the page contents are only
// ever written by the kernel. Concurrent read() from multiple threads is
// still the caller's responsibility to avoid (single-reader protocol).
unsafe impl Send for HwCounter {}

impl HwCounter {
    /// Open a counter for `spec` on thread `tid` and map its control page.
    ///
    /// `group` joins the new counter to an existing counter's multiplexing
    /// group so the kernel schedules them together.
    ///
    /// Never fails loudly: any setup error yields an inactive handle,
    /// observable via [`active`](Self::active).
    #[must_use]
    pub fn open(spec: &EventSpec, group: Option<&HwCounter>, tid: Tid) -> HwCounter {
        let inactive = HwCounter { fd: INVALID_FD, page: ptr::null_mut(), tid };

        let mut attr = spec.attr();
        let group_fd = group.map_or(INVALID_FD, |g| g.fd);

        // SAFETY: attr is a fully initialized perf_event_attr that outlives
        // the call; remaining arguments are plain integers.
        let ret = unsafe {
            libc::syscall(
                libc::SYS_perf_event_open,
                ptr::addr_of_mut!(attr),
                tid.0 as libc::pid_t,
                -1 as libc::c_int, // any cpu
                group_fd,
                0 as libc::c_ulong,
            )
        };
        if ret < 0 {
            debug!(
                "perf_event_open failed for event '{}' on {}: {}",
                spec.event(),
                tid,
                io::Error::last_os_error()
            );
            return inactive;
        }
        #[allow(clippy::cast_possible_truncation)]
        let fd = ret as RawFd;

        // SAFETY: fd is a live perf event descriptor; mapping one page
        // read-only is the documented way to reach its control page.
        let addr = unsafe {
            libc::mmap(ptr::null_mut(), page_len(), libc::PROT_READ, libc::MAP_SHARED, fd, 0)
        };
        if addr == libc::MAP_FAILED {
            debug!("mmap of counter page failed: {}", io::Error::last_os_error());
            // SAFETY: fd was just opened and is owned here.
            unsafe { libc::close(fd) };
            return inactive;
        }

        HwCounter { fd, page: addr.cast::<PerfEventMmapPage>(), tid }
    }

    /// Whether both the descriptor and the mapping were set up.
    ///
    /// The two always live and die together, so a single check covers both.
    #[must_use]
    pub fn active(&self) -> bool {
        self.fd != INVALID_FD && !self.page.is_null()
    }

    /// Thread this counter is attached to (informational).
    #[must_use]
    pub fn tid(&self) -> Tid {
        self.tid
    }

    /// Raw descriptor, for joining further counters to this one's group.
    #[must_use]
    pub fn as_raw_fd(&self) -> RawFd {
        self.fd
    }

    /// Current accumulated counter value, read without blocking or locking.
    ///
    /// Safe against the kernel rewriting the control page concurrently (a
    /// context switch rescheduling the counter): torn reads are detected
    /// through the page's generation count and retried. The value is
    /// monotonic while the handle stays open and wraps at the hardware
    /// counter width; no adjustment across open/close boundaries is made.
    ///
    /// Must only be called on an active handle, from one thread at a time.
    #[cfg(target_arch = "x86_64")]
    #[must_use]
    pub fn read(&self) -> u64 {
        debug_assert!(self.active(), "read() on an inactive counter");
        read_counter(&MappedPage { page: self.page })
    }

    /// Current accumulated counter value.
    ///
    /// Portable fallback for targets without a user-space counter-read
    /// instruction: one `read(2)` on the descriptor per sample, roughly a
    /// microsecond instead of the ~20-cycle mapped-page path.
    #[cfg(not(target_arch = "x86_64"))]
    #[must_use]
    pub fn read(&self) -> u64 {
        debug_assert!(self.active(), "read() on an inactive counter");
        let mut value: u64 = 0;
        // SAFETY: fd is live while self is; the buffer is 8 writable bytes.
        let n = unsafe {
            libc::read(self.fd, ptr::addr_of_mut!(value).cast(), std::mem::size_of::<u64>())
        };
        if n != std::mem::size_of::<u64>() as isize {
            debug!("counter read(2) fallback failed: {}", io::Error::last_os_error());
        }
        value
    }

    /// Start counting.
    ///
    /// # Errors
    /// Returns the ioctl error, `EBADF` included when the handle is inactive.
    pub fn enable(&self) -> io::Result<()> {
        self.ioctl(PERF_EVENT_IOC_ENABLE)
    }

    /// Stop counting; the accumulated value stays readable.
    ///
    /// # Errors
    /// Returns the ioctl error, `EBADF` included when the handle is inactive.
    pub fn disable(&self) -> io::Result<()> {
        self.ioctl(PERF_EVENT_IOC_DISABLE)
    }

    /// Zero the accumulated value.
    ///
    /// # Errors
    /// Returns the ioctl error, `EBADF` included when the handle is inactive.
    pub fn reset_count(&self) -> io::Result<()> {
        self.ioctl(PERF_EVENT_IOC_RESET)
    }

    fn ioctl(&self, request: libc::c_ulong) -> io::Result<()> {
        // SAFETY: request is one of the argument-less perf event ioctls; an
        // invalid fd is rejected by the kernel, not undefined behavior.
        let ret = unsafe { libc::ioctl(self.fd, request, 0) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl Drop for HwCounter {
    fn drop(&mut self) {
        if !self.active() {
            return;
        }
        // SAFETY: active() implies both resources are live and exclusively
        // owned; sentinels are restored so a double drop cannot re-release.
        unsafe {
            libc::munmap(self.page.cast::<libc::c_void>(), page_len());
            libc::close(self.fd);
        }
        self.page = ptr::null_mut();
        self.fd = INVALID_FD;
    }
}

/// Volatile field view over the live kernel page.
#[cfg(target_arch = "x86_64")]
struct MappedPage {
    page: *const PerfEventMmapPage,
}

#[cfg(target_arch = "x86_64")]
impl CounterPage for MappedPage {
    fn seq(&self) -> u32 {
        // SAFETY: page points at a mapping that outlives this view; volatile
        // loads keep the compiler from caching fields across retries.
        unsafe { ptr::read_volatile(ptr::addr_of!((*self.page).lock)) }
    }

    fn offset(&self) -> i64 {
        // SAFETY: as above.
        unsafe { ptr::read_volatile(ptr::addr_of!((*self.page).offset)) }
    }

    fn index(&self) -> u32 {
        // SAFETY: as above.
        unsafe { ptr::read_volatile(ptr::addr_of!((*self.page).index)) }
    }

    fn read_pmc(&self, slot: u32) -> u64 {
        let lo: u32;
        let hi: u32;
        // SAFETY: only reached when the kernel published a nonzero index,
        // which implies rdpmc is permitted for this counter from user space.
        unsafe {
            core::arch::asm!(
                "rdpmc",
                in("ecx") slot,
                out("eax") lo,
                out("edx") hi,
                options(nomem, nostack, preserves_flags),
            );
        }
        (u64::from(hi) << 32) | u64::from(lo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perf::HardwareEvent;

    fn any_spec() -> EventSpec {
        EventSpec::new(HardwareEvent::Instructions)
    }

    #[test]
    fn failed_open_yields_inactive_handle() {
        // Attaching to a nonexistent thread fails regardless of privileges.
        let counter = HwCounter::open(&any_spec(), None, Tid(u32::MAX - 1));
        assert!(!counter.active());
        assert_eq!(counter.as_raw_fd(), INVALID_FD);
        // Dropping the inactive handle must be a no-op (no close/munmap).
        drop(counter);
    }

    #[test]
    fn inactive_handle_ioctls_report_errors() {
        let counter = HwCounter::open(&any_spec(), None, Tid(u32::MAX - 1));
        assert!(counter.enable().is_err());
        assert!(counter.disable().is_err());
        assert!(counter.reset_count().is_err());
    }

    #[test]
    fn moved_handle_keeps_working() {
        let counter = HwCounter::open(&any_spec(), None, Tid(u32::MAX - 1));
        let tid = counter.tid();
        // Moving transfers the whole handle; drop runs exactly once.
        let moved = counter;
        assert_eq!(moved.tid(), tid);
        assert!(!moved.active());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn self_counter_counts_when_permitted() {
        let spec = EventSpec::new(HardwareEvent::Instructions);
        let counter = HwCounter::open(&spec, None, Tid::SELF);
        if !counter.active() {
            // No perf access in this environment (paranoid level / container)
            return;
        }
        counter.enable().unwrap();
        let before = counter.read();
        // Burn a few instructions the counter should observe.
        let mut acc = 0u64;
        for i in 0..10_000u64 {
            acc = acc.wrapping_add(std::hint::black_box(i));
        }
        std::hint::black_box(acc);
        let after = counter.read();
        counter.disable().unwrap();
        assert!(after >= before, "counter went backwards: {before} -> {after}");
    }
}
