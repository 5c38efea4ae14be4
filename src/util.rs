//! Internal utilities.

/// Returns the number of processors currently online.
///
/// Uses `sysconf(_SC_NPROCESSORS_ONLN)`; `None` if the query fails.
#[must_use]
pub fn online_cpus() -> Option<usize> {
    // SAFETY: `sysconf` only reads a system configuration value and has no
    // memory-safety preconditions.
    let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    usize::try_from(n).ok().filter(|&n| n > 0)
}
