//! Concurrent fetch-validate-persist pipeline.
//!
//! This module provides the single-URL [`Fetcher`] and the [`DownloadEngine`]
//! that runs many fetches on a bounded worker pool.
//!
//! # Features
//!
//! - Streaming downloads (bodies are never buffered whole in memory)
//! - Content-type validation against the image registry, with extension
//!   normalization
//! - 10 second connect and read timeouts by default
//! - Per-item failures reported as values, never as batch errors
//! - Unordered completion with a progress bar
//!
//! # Example
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let urls = ["https://example.com/a.jpg", "https://example.com/b.png"];
//! let report = image_dl::download_all(urls, "./images", None, true).await?;
//! println!("saved {}, failed {}", report.succeeded(), report.failed());
//! # Ok(())
//! # }
//! ```

pub(crate) mod constants;
mod engine;
mod error;
mod fetcher;
mod filename;
mod progress;
mod task;

pub use constants::{CONNECT_TIMEOUT_SECS, MAX_WORKERS, READ_TIMEOUT_SECS, WORKERS_PER_CPU};
pub use engine::{BatchReport, DownloadEngine, EngineError, download_all};
pub use error::{FailureKind, FetchError};
pub use fetcher::Fetcher;
pub use progress::BatchProgress;
pub use task::{DownloadResult, DownloadTask, SavedFile, TaskFailure};
