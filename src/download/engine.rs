//! Download engine: fans a URL list out to a bounded pool of fetch workers.
//!
//! This module provides the `DownloadEngine` which coordinates concurrent
//! fetches using a semaphore-based concurrency limit, and collects results in
//! completion order.
//!
//! # Concurrency Model
//!
//! - Every task is spawned on the Tokio runtime up front
//! - A task acquires a semaphore permit before it touches the network, so at
//!   most `workers` fetches are in flight
//! - The engine consumes results with `JoinSet::join_next_with_id`, i.e. in
//!   whichever order they finish, and advances the progress bar per result
//! - A panicking or cancelled task still yields one failed result for its URL
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use image_dl::{DownloadConfig, DownloadEngine, MimeTypeRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DownloadConfig::new("./images").with_workers(Some(32));
//! let engine = DownloadEngine::from_config(&config, Arc::new(MimeTypeRegistry::standard()))?;
//! let urls = vec!["https://example.com/a.jpg".to_string()];
//! let report = engine.download_all(urls, config.dest_dir()).await;
//! println!("{} of {} saved", report.succeeded(), report.submitted());
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tracing::{debug, info, instrument, warn};

use super::constants::{MAX_WORKERS, MIN_WORKERS};
use super::error::FailureKind;
use super::fetcher::Fetcher;
use super::progress::BatchProgress;
use super::task::{DownloadResult, DownloadTask};
use crate::config::DownloadConfig;
use crate::mime::MimeTypeRegistry;

/// Error type for download engine operations.
///
/// These are setup or infrastructure failures. A single URL failing is never
/// an `EngineError`; it is recorded in the [`BatchReport`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkerCount {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Outcome of a whole batch.
///
/// Holds one [`DownloadResult`] per submitted task, in completion order.
#[derive(Debug, Default)]
pub struct BatchReport {
    submitted: usize,
    results: Vec<DownloadResult>,
}

impl BatchReport {
    /// Number of tasks dispatched.
    #[must_use]
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Number of tasks that produced an outcome.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.results.len()
    }

    /// Number of files written.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of tasks that produced no file.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.completed() - self.succeeded()
    }

    /// Failure counts grouped by kind.
    #[must_use]
    pub fn failure_counts(&self) -> BTreeMap<FailureKind, usize> {
        let mut counts = BTreeMap::new();
        for kind in self.results.iter().filter_map(DownloadResult::failure_kind) {
            *counts.entry(kind).or_insert(0) += 1;
        }
        counts
    }

    /// Paths of every written file, in completion order.
    #[must_use]
    pub fn saved_paths(&self) -> Vec<PathBuf> {
        self.results
            .iter()
            .filter_map(|r| r.path().map(Path::to_path_buf))
            .collect()
    }

    /// Results in completion order.
    #[must_use]
    pub fn results(&self) -> &[DownloadResult] {
        &self.results
    }
}

/// Download engine for concurrent fetches with a fixed worker count.
#[derive(Debug)]
pub struct DownloadEngine {
    fetcher: Fetcher,
    /// Bounds in-flight fetches to `workers`.
    semaphore: Arc<Semaphore>,
    workers: usize,
    check_content_type: bool,
    show_progress: bool,
}

impl DownloadEngine {
    /// Creates an engine around an existing fetcher.
    ///
    /// Content-type validation starts enabled and the progress bar hidden.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidWorkerCount`] if `workers` is outside
    /// the valid range (1-1024).
    #[instrument(level = "debug", skip(fetcher))]
    pub fn new(fetcher: Fetcher, workers: usize) -> Result<Self, EngineError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(EngineError::InvalidWorkerCount { value: workers });
        }

        debug!(workers, "creating download engine");

        Ok(Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
            check_content_type: true,
            show_progress: false,
        })
    }

    /// Builds the fetcher and engine described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidWorkerCount`] for an out-of-range worker
    /// count and [`EngineError::Client`] if the HTTP client cannot be built.
    pub fn from_config(
        config: &DownloadConfig,
        registry: Arc<MimeTypeRegistry>,
    ) -> Result<Self, EngineError> {
        let fetcher = Fetcher::with_timeouts(
            registry,
            config.connect_timeout(),
            config.read_timeout(),
        )?;
        Ok(Self::new(fetcher, config.worker_count())?
            .with_check_content_type(config.check_content_type())
            .with_progress(config.show_progress()))
    }

    #[must_use]
    pub fn with_check_content_type(mut self, check: bool) -> Self {
        self.check_content_type = check;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Returns the configured worker count.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    #[must_use]
    pub fn check_content_type(&self) -> bool {
        self.check_content_type
    }

    /// Downloads every URL into `dest_dir`, deriving filenames from the URLs.
    ///
    /// Runs to completion of the whole list; individual failures are counted
    /// in the report, never returned.
    pub async fn download_all<I, S>(&self, urls: I, dest_dir: &Path) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tasks = urls
            .into_iter()
            .map(|url| {
                DownloadTask::new(url, dest_dir).with_check_content_type(self.check_content_type)
            })
            .collect();
        self.run_tasks(tasks).await
    }

    /// Runs prepared tasks (for example with explicit filenames).
    #[instrument(skip(self, tasks), fields(tasks = tasks.len(), workers = self.workers))]
    pub async fn run_tasks(&self, tasks: Vec<DownloadTask>) -> BatchReport {
        let submitted = tasks.len();
        let mut progress = BatchProgress::new(submitted, self.show_progress);
        let mut set = JoinSet::new();
        let mut urls_by_task = HashMap::with_capacity(submitted);

        info!("starting batch");

        for task in tasks {
            let fetcher = self.fetcher.clone();
            let semaphore = Arc::clone(&self.semaphore);
            let url = task.url().to_string();

            let handle = set.spawn(async move {
                match semaphore.acquire_owned().await {
                    // Permit is dropped when this arm exits (RAII)
                    Ok(_permit) => fetcher.fetch(&task).await,
                    Err(_) => DownloadResult::aborted(task.url(), "worker pool closed"),
                }
            });
            urls_by_task.insert(handle.id(), url);
        }

        let results = collect_results(set, urls_by_task, &mut progress).await;
        progress.finish();

        let report = BatchReport { submitted, results };
        info!(
            submitted = report.submitted(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "batch complete"
        );
        report
    }
}

/// Drains `set` in completion order, one result per spawned task.
///
/// A task that panicked or was cancelled is reported against the URL recorded
/// for its task id.
async fn collect_results(
    mut set: JoinSet<DownloadResult>,
    mut urls_by_task: HashMap<Id, String>,
    progress: &mut BatchProgress,
) -> Vec<DownloadResult> {
    let mut results = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next_with_id().await {
        let result = match joined {
            Ok((id, result)) => {
                urls_by_task.remove(&id);
                result
            }
            Err(join_error) => {
                let url = urls_by_task.remove(&join_error.id()).unwrap_or_default();
                if join_error.is_panic() {
                    warn!(url = %url, error = %join_error, "download task panicked");
                    DownloadResult::panicked(url, join_error.to_string())
                } else {
                    warn!(url = %url, "download task cancelled");
                    DownloadResult::aborted(url, join_error.to_string())
                }
            }
        };
        progress.advance();
        results.push(result);
    }
    results
}

/// Downloads `urls` into `dest_dir` with the standard image registry.
///
/// `workers` defaults to eight per logical CPU. A progress bar is drawn on
/// stderr when it is a terminal.
///
/// # Errors
///
/// See [`DownloadEngine::from_config`].
pub async fn download_all<I, S>(
    urls: I,
    dest_dir: impl AsRef<Path>,
    workers: Option<usize>,
    check_content_type: bool,
) -> Result<BatchReport, EngineError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let config = DownloadConfig::new(dest_dir.as_ref())
        .with_workers(workers)
        .with_check_content_type(check_content_type);
    let engine = DownloadEngine::from_config(&config, Arc::new(MimeTypeRegistry::standard()))?;
    Ok(engine.download_all(urls, config.dest_dir()).await)
}
