//! Hardware event selection and attribute construction

use std::fmt;
use std::str::FromStr;

use pulsescope_common::perf::{
    PerfEventAttr, ATTR_FLAG_DISABLED, ATTR_FLAG_EXCLUDE_HV, ATTR_FLAG_EXCLUDE_KERNEL,
    PERF_COUNT_HW_BRANCH_INSTRUCTIONS, PERF_COUNT_HW_BRANCH_MISSES, PERF_COUNT_HW_BUS_CYCLES,
    PERF_COUNT_HW_CACHE_MISSES, PERF_COUNT_HW_CACHE_REFERENCES, PERF_COUNT_HW_CPU_CYCLES,
    PERF_COUNT_HW_INSTRUCTIONS, PERF_COUNT_HW_REF_CPU_CYCLES, PERF_TYPE_HARDWARE,
};

use crate::domain::CounterError;

/// Generalized hardware events the kernel maps onto vendor PMU encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareEvent {
    CpuCycles,
    Instructions,
    CacheReferences,
    CacheMisses,
    BranchInstructions,
    BranchMisses,
    BusCycles,
    RefCpuCycles,
}

impl HardwareEvent {
    /// `attr.config` value for this event
    #[must_use]
    pub fn config(self) -> u64 {
        match self {
            HardwareEvent::CpuCycles => PERF_COUNT_HW_CPU_CYCLES,
            HardwareEvent::Instructions => PERF_COUNT_HW_INSTRUCTIONS,
            HardwareEvent::CacheReferences => PERF_COUNT_HW_CACHE_REFERENCES,
            HardwareEvent::CacheMisses => PERF_COUNT_HW_CACHE_MISSES,
            HardwareEvent::BranchInstructions => PERF_COUNT_HW_BRANCH_INSTRUCTIONS,
            HardwareEvent::BranchMisses => PERF_COUNT_HW_BRANCH_MISSES,
            HardwareEvent::BusCycles => PERF_COUNT_HW_BUS_CYCLES,
            HardwareEvent::RefCpuCycles => PERF_COUNT_HW_REF_CPU_CYCLES,
        }
    }
}

impl fmt::Display for HardwareEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HardwareEvent::CpuCycles => "cycles",
            HardwareEvent::Instructions => "instructions",
            HardwareEvent::CacheReferences => "cache-references",
            HardwareEvent::CacheMisses => "cache-misses",
            HardwareEvent::BranchInstructions => "branches",
            HardwareEvent::BranchMisses => "branch-misses",
            HardwareEvent::BusCycles => "bus-cycles",
            HardwareEvent::RefCpuCycles => "ref-cycles",
        };
        f.pad(name)
    }
}

impl FromStr for HardwareEvent {
    type Err = CounterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cycles" => Ok(HardwareEvent::CpuCycles),
            "instructions" => Ok(HardwareEvent::Instructions),
            "cache-references" => Ok(HardwareEvent::CacheReferences),
            "cache-misses" => Ok(HardwareEvent::CacheMisses),
            "branches" => Ok(HardwareEvent::BranchInstructions),
            "branch-misses" => Ok(HardwareEvent::BranchMisses),
            "bus-cycles" => Ok(HardwareEvent::BusCycles),
            "ref-cycles" => Ok(HardwareEvent::RefCpuCycles),
            other => Err(CounterError::UnknownEvent(other.to_string())),
        }
    }
}

/// Configuration for one counter, turned into a `perf_event_attr`.
///
/// Defaults are user-mode-only counting, opened disabled so callers can arm
/// the counter precisely with [`HwCounter::enable`](super::HwCounter::enable).
#[derive(Debug, Clone)]
pub struct EventSpec {
    event: HardwareEvent,
    exclude_kernel: bool,
    exclude_hv: bool,
    start_disabled: bool,
}

impl EventSpec {
    #[must_use]
    pub fn new(event: HardwareEvent) -> Self {
        Self { event, exclude_kernel: true, exclude_hv: true, start_disabled: true }
    }

    /// Count kernel-mode events too (needs a permissive `perf_event_paranoid`)
    #[must_use]
    pub fn include_kernel(mut self) -> Self {
        self.exclude_kernel = false;
        self
    }

    /// Open the counter already running instead of disabled
    #[must_use]
    pub fn start_enabled(mut self) -> Self {
        self.start_disabled = false;
        self
    }

    #[must_use]
    pub fn event(&self) -> HardwareEvent {
        self.event
    }

    /// Build the attribute block passed to `perf_event_open(2)`.
    #[must_use]
    pub fn attr(&self) -> PerfEventAttr {
        let mut attr = PerfEventAttr::sized();
        attr.type_ = PERF_TYPE_HARDWARE;
        attr.config = self.event.config();
        if self.start_disabled {
            attr.flags |= ATTR_FLAG_DISABLED;
        }
        if self.exclude_kernel {
            attr.flags |= ATTR_FLAG_EXCLUDE_KERNEL;
        }
        if self.exclude_hv {
            attr.flags |= ATTR_FLAG_EXCLUDE_HV;
        }
        attr
    }
}
