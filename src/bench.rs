//! Worker-count benchmark: runs one batch per worker count and times it.
//!
//! Useful for picking a `--workers` value on a given machine and network.
//! Results are written as JSON keyed by worker count:
//!
//! ```json
//! {
//!   "1": { "elapsed_secs": 41.2, "succeeded": 1000, "failed": 10 },
//!   "6": { "elapsed_secs": 7.9, "succeeded": 1000, "failed": 10 }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::DownloadConfig;
use crate::download::{DownloadEngine, EngineError};
use crate::mime::MimeTypeRegistry;

/// Errors from running or recording a worker sweep.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The requested worker range is empty or has a zero step.
    #[error("invalid worker range {from}..{to} step {step}")]
    InvalidRange {
        /// First worker count.
        from: usize,
        /// Exclusive upper bound.
        to: usize,
        /// Increment between runs.
        step: usize,
    },

    /// A batch could not be set up.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Serializing the results failed.
    #[error("failed to serialize bench results: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the results file failed.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// Results file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Timing and outcome counts for one worker count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRun {
    /// Wall-clock seconds for the whole batch.
    pub elapsed_secs: f64,
    pub succeeded: usize,
    pub failed: usize,
}

/// Worker counts `from, from + step, ...` below `to`.
///
/// # Errors
///
/// Returns [`BenchError::InvalidRange`] if `step` or `from` is zero or the
/// range is empty.
pub fn worker_range(from: usize, to: usize, step: usize) -> Result<Vec<usize>, BenchError> {
    if step == 0 || from == 0 || from >= to {
        return Err(BenchError::InvalidRange { from, to, step });
    }
    Ok((from..to).step_by(step).collect())
}

/// Runs the full URL list once per worker count, in the given order.
///
/// Every run uses `base` for destination, validation, and timeouts; only the
/// worker count changes.
///
/// # Errors
///
/// Returns [`BenchError::Engine`] if an engine cannot be built (for example
/// an out-of-range worker count).
pub async fn run_worker_sweep(
    urls: &[String],
    base: &DownloadConfig,
    registry: Arc<MimeTypeRegistry>,
    worker_counts: &[usize],
) -> Result<BTreeMap<usize, SweepRun>, BenchError> {
    let mut results = BTreeMap::new();
    for &workers in worker_counts {
        info!(workers, urls = urls.len(), "benchmarking worker count");
        let config = base.clone().with_workers(Some(workers));
        let engine = DownloadEngine::from_config(&config, Arc::clone(&registry))?;

        let start = Instant::now();
        let report = engine
            .download_all(urls.iter().cloned(), config.dest_dir())
            .await;
        let elapsed_secs = start.elapsed().as_secs_f64();

        info!(
            workers,
            elapsed_secs,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "benchmark run complete"
        );
        results.insert(
            workers,
            SweepRun {
                elapsed_secs,
                succeeded: report.succeeded(),
                failed: report.failed(),
            },
        );
    }
    Ok(results)
}

/// Writes sweep results as pretty-printed JSON, replacing any existing file.
///
/// # Errors
///
/// Returns [`BenchError::Json`] or [`BenchError::Io`].
pub fn write_results(path: &Path, results: &BTreeMap<usize, SweepRun>) -> Result<(), BenchError> {
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(path, json).map_err(|source| BenchError::Io {
        path: path.to_path_buf(),
        source,
    })
}
