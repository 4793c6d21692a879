//! image-dl core library
//!
//! Bulk URL-to-file downloading: fetch each URL over HTTP, check that the
//! response is an image, and write it into a destination folder, with a
//! bounded pool of concurrent workers and a progress bar over the batch.
//!
//! # Architecture
//!
//! - [`download`] - Fetcher (one URL) and engine (worker pool, unordered
//!   result collection, progress)
//! - [`mime`] - Read-only content-type to extension registry
//! - [`config`] - Batch settings and the default worker count
//! - [`input`] - URL list parsing
//! - [`bench`] - Worker-count timing sweep
//!
//! # Example
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let urls = vec!["https://example.com/cat.jpg".to_string()];
//! let report = image_dl::download_all(urls, "./images", None, true).await?;
//! assert_eq!(report.completed(), report.submitted());
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bench;
pub mod config;
pub mod download;
pub mod input;
pub mod mime;
pub(crate) mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{DownloadConfig, default_worker_count};
pub use download::{
    BatchReport, DownloadEngine, DownloadResult, DownloadTask, EngineError, FailureKind,
    FetchError, Fetcher, MAX_WORKERS, SavedFile, TaskFailure, download_all,
};
pub use input::parse_url_list;
pub use mime::MimeTypeRegistry;
