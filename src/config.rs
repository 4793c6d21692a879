//! Programmatic configuration for a download batch.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::download::constants::{
    CONNECT_TIMEOUT_SECS, MAX_WORKERS, READ_TIMEOUT_SECS, WORKERS_PER_CPU,
};

/// Default worker count: `8 × logical CPUs`, capped at the pool maximum.
///
/// Falls back to one CPU when the platform cannot report its parallelism.
#[must_use]
pub fn default_worker_count() -> usize {
    let cpus = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
    cpus.saturating_mul(WORKERS_PER_CPU).min(MAX_WORKERS)
}

/// Settings for one batch run.
///
/// # Example
///
/// ```
/// use image_dl::DownloadConfig;
///
/// let config = DownloadConfig::new("./images")
///     .with_workers(Some(16))
///     .with_check_content_type(false);
/// assert_eq!(config.worker_count(), 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    dest_dir: PathBuf,
    workers: Option<usize>,
    check_content_type: bool,
    connect_timeout: Duration,
    read_timeout: Duration,
    show_progress: bool,
}

impl DownloadConfig {
    /// Creates a config for `dest_dir` with default workers, validation on,
    /// 10 second timeouts, and a visible progress bar.
    pub fn new(dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            dest_dir: dest_dir.into(),
            workers: None,
            check_content_type: true,
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
            show_progress: true,
        }
    }

    /// Sets the worker count; `None` selects [`default_worker_count`].
    #[must_use]
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn with_check_content_type(mut self, check: bool) -> Self {
        self.check_content_type = check;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    #[must_use]
    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Explicit worker count, or the hardware-derived default.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(default_worker_count)
    }

    #[must_use]
    pub fn check_content_type(&self) -> bool {
        self.check_content_type
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.show_progress
    }
}
