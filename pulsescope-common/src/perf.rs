//! Linux `perf_event` ABI mirrors.
//!
//! Hand-rolled `#[repr(C)]` subsets of `<linux/perf_event.h>` rather than a
//! bindings crate, so the exact layout this code relies on is visible here.
//! Offsets and widths must not drift from the kernel headers.

use core::ffi::c_ulong;
use core::mem;

// ============================================================================
// Event Type Constants
// ============================================================================

/// Generalized hardware events (`attr.type`)
pub const PERF_TYPE_HARDWARE: u32 = 0;
/// Software events provided by the kernel (`attr.type`)
pub const PERF_TYPE_SOFTWARE: u32 = 1;
/// Raw, CPU-specific event descriptor (`attr.type`)
pub const PERF_TYPE_RAW: u32 = 4;

/// `attr.config` values for `PERF_TYPE_HARDWARE`
pub const PERF_COUNT_HW_CPU_CYCLES: u64 = 0;
pub const PERF_COUNT_HW_INSTRUCTIONS: u64 = 1;
pub const PERF_COUNT_HW_CACHE_REFERENCES: u64 = 2;
pub const PERF_COUNT_HW_CACHE_MISSES: u64 = 3;
pub const PERF_COUNT_HW_BRANCH_INSTRUCTIONS: u64 = 4;
pub const PERF_COUNT_HW_BRANCH_MISSES: u64 = 5;
pub const PERF_COUNT_HW_BUS_CYCLES: u64 = 6;
pub const PERF_COUNT_HW_REF_CPU_CYCLES: u64 = 9;

// ============================================================================
// Attribute Flag Bits
// ============================================================================

/// Counter starts disabled; armed later via `PERF_EVENT_IOC_ENABLE`
pub const ATTR_FLAG_DISABLED: u64 = 1 << 0;
/// Children inherit the counter across `clone(2)`
pub const ATTR_FLAG_INHERIT: u64 = 1 << 1;
/// Don't count while in kernel mode
pub const ATTR_FLAG_EXCLUDE_KERNEL: u64 = 1 << 5;
/// Don't count while in hypervisor mode
pub const ATTR_FLAG_EXCLUDE_HV: u64 = 1 << 6;

// ============================================================================
// Ioctl Requests
// ============================================================================

pub const PERF_EVENT_IOC_ENABLE: c_ulong = 0x2400;
pub const PERF_EVENT_IOC_DISABLE: c_ulong = 0x2401;
pub const PERF_EVENT_IOC_RESET: c_ulong = 0x2403;

// ============================================================================
// Structures
// ============================================================================

/// `perf_event_attr` (subset sufficient for counting-mode events).
///
/// The kernel validates `size`, so [`PerfEventAttr::sized`] must be used to
/// obtain an instance with the size field already populated.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PerfEventAttr {
    pub type_: u32,
    pub size: u32,
    pub config: u64,
    pub sample_period: u64,
    pub sample_type: u64,
    pub read_format: u64,
    /// Bitfield word; see the `ATTR_FLAG_*` constants
    pub flags: u64,
    pub wakeup_events: u32,
    pub bp_type: u32,
    pub config1: u64,
    pub config2: u64,
    pub branch_sample_type: u64,
    pub sample_regs_user: u64,
    pub sample_stack_user: u32,
    pub clockid: i32,
    pub sample_regs_intr: u64,
    pub aux_watermark: u32,
    pub sample_max_stack: u16,
    pub __reserved_2: u16,
    pub aux_sample_size: u32,
    pub __reserved_3: u32,
    pub sig_data: u64,
    pub config3: u64,
}

impl PerfEventAttr {
    /// Zeroed attribute block with `size` filled in.
    #[must_use]
    pub fn sized() -> Self {
        #[allow(clippy::cast_possible_truncation)]
        Self { size: mem::size_of::<Self>() as u32, ..Self::default() }
    }
}

/// Header of the control page the kernel maps for each counter
/// (`perf_event_mmap_page`).
///
/// The seqlock fields (`lock`, `index`, `offset`) are the ones the
/// user-space read protocol depends on; the rest are carried so the struct
/// stays layout-identical to the kernel's definition.
#[repr(C)]
pub struct PerfEventMmapPage {
    pub version: u32,
    pub compat_version: u32,
    /// Seqlock generation count; odd or changing while the kernel updates
    pub lock: u32,
    /// Hardware slot + 1 if the counter is scheduled, 0 otherwise
    pub index: u32,
    /// Accumulated count excluding what the live register holds
    pub offset: i64,
    pub time_enabled: u64,
    pub time_running: u64,
    /// Capability bits; see [`CAP_USER_RDPMC`]
    pub capabilities: u64,
    pub pmc_width: u16,
    pub time_shift: u16,
    pub time_mult: u32,
    pub time_offset: u64,
    pub time_zero: u64,
    pub size: u32,
    pub __reserved_1: u32,
    pub time_cycles: u64,
    pub time_mask: u64,
    pub __reserved: [u8; 116 * 8],
    pub data_head: u64,
    pub data_tail: u64,
    pub data_offset: u64,
    pub data_size: u64,
    pub aux_head: u64,
    pub aux_tail: u64,
    pub aux_offset: u64,
    pub aux_size: u64,
}

/// `capabilities` bit: user space may read the counter with `rdpmc`
pub const CAP_USER_RDPMC: u64 = 1 << 2;
