//! Pre-flight checks for pulsescope
//!
//! Validates the environment before any counter is opened, so users get an
//! actionable message instead of a silently inactive handle.

#![allow(unsafe_code)] // geteuid() requires unsafe

use anyhow::{bail, Context, Result};

/// Kernel floor for the counter features used here (rdpmc capability bits
/// in the mapped page landed in 3.12; keep a small margin)
const MIN_KERNEL_VERSION: (u32, u32) = (4, 0);

/// Most restrictive `perf_event_paranoid` level that still allows an
/// unprivileged process to count its own threads
const MAX_USABLE_PARANOID: i32 = 2;

/// Run all pre-flight checks before opening counters
pub fn run_preflight_checks() -> Result<()> {
    check_perf_access()?;
    check_kernel_version()?;
    Ok(())
}

/// Check that perf_event_open is usable at the current privilege level
fn check_perf_access() -> Result<()> {
    // Root passes regardless of the paranoid level
    if unsafe { libc::geteuid() } == 0 {
        return Ok(());
    }

    let raw = std::fs::read_to_string("/proc/sys/kernel/perf_event_paranoid")
        .context("Failed to read /proc/sys/kernel/perf_event_paranoid")?;
    let level: i32 = raw.trim().parse().unwrap_or(MAX_USABLE_PARANOID);

    if level > MAX_USABLE_PARANOID {
        bail!(
            "perf_event_paranoid is {level}: unprivileged processes cannot open \
             hardware counters.\n\n\
             Either run as root, or lower the restriction:\n    \
             sudo sysctl kernel.perf_event_paranoid={MAX_USABLE_PARANOID}"
        );
    }
    Ok(())
}

/// Check that the kernel is recent enough for mapped-page counter reads
fn check_kernel_version() -> Result<()> {
    let version_str = std::fs::read_to_string("/proc/version")
        .context("Failed to read kernel version from /proc/version")?;

    let release = version_str.split_whitespace().nth(2).unwrap_or("unknown");
    let Some((major, minor)) = parse_release(release) else {
        // Unparseable vendor string, assume it's fine
        return Ok(());
    };

    if (major, minor) < MIN_KERNEL_VERSION {
        bail!(
            "Kernel {major}.{minor} is too old: pulsescope needs Linux {}.{} or newer \
             for user-space counter reads through the mapped control page.\n\
             Current kernel: {release}",
            MIN_KERNEL_VERSION.0,
            MIN_KERNEL_VERSION.1,
        );
    }
    Ok(())
}

fn parse_release(release: &str) -> Option<(u32, u32)> {
    let mut parts = release.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor: u32 = parts
        .next()?
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .ok()?;
    Some((major, minor))
}
