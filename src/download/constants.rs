//! Constants for the download module (timeouts, pool sizing).

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default HTTP read timeout between body chunks (10 seconds).
pub const READ_TIMEOUT_SECS: u64 = 10;

/// Workers per logical CPU when no worker count is given.
///
/// Fetches spend nearly all their time blocked on the network, so the pool
/// is sized well past the CPU count.
pub const WORKERS_PER_CPU: usize = 8;

/// Minimum allowed worker count.
pub const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
pub const MAX_WORKERS: usize = 1024;

/// Base name used when a URL has no usable last path segment.
pub const FALLBACK_FILE_STEM: &str = "download";
