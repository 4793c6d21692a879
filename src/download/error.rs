//! Error types for the download module.
//!
//! Every per-item failure is a [`FetchError`]. The fetcher never lets one of
//! these escape as a panic or an early return from the batch; it is recorded
//! in the item's [`DownloadResult`](super::DownloadResult) and logged.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching and saving a single URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL did not parse, or its scheme is not http/https.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected URL string.
        url: String,
    },

    /// DNS failure, refused connection, timeout, or a network error mid-body.
    #[error("connection failed for {url}: {source}")]
    Connection {
        /// The URL that could not be fetched.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a status outside the 2xx range.
    #[error("HTTP {status} for {url}")]
    BadStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The declared content type is missing or not a recognized image type.
    #[error("content type {content_type} for {url} is not an image type")]
    InvalidContentType {
        /// The URL whose response was rejected.
        url: String,
        /// The normalized content type (`NONE` when the header was absent).
        content_type: String,
    },

    /// Creating the destination directory or writing the file failed.
    #[error("IO error writing to {path}: {source}")]
    Write {
        /// The file or directory path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a connection error from a reqwest error.
    pub fn connection(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Connection {
            url: url.into(),
            source,
        }
    }

    /// Creates a bad status error.
    pub fn bad_status(url: impl Into<String>, status: u16) -> Self {
        Self::BadStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid content type error.
    pub fn invalid_content_type(url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::InvalidContentType {
            url: url.into(),
            content_type: content_type.into(),
        }
    }

    /// Creates a write error.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Returns the failure category used for batch tallies.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidUrl { .. } => FailureKind::InvalidUrl,
            Self::Connection { .. } => FailureKind::ConnectionFailure,
            Self::BadStatus { .. } => FailureKind::BadStatus,
            Self::InvalidContentType { .. } => FailureKind::InvalidContentType,
            Self::Write { .. } => FailureKind::WriteFailure,
        }
    }

    /// Returns true if the failure was a connect or read timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Connection { source, .. } if source.is_timeout())
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// URL or path for the log line, which the source errors do not carry.

/// Category of a failed download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FailureKind {
    /// Malformed or non-HTTP URL.
    InvalidUrl,
    /// DNS, refusal, timeout, or body read failure.
    ConnectionFailure,
    /// Non-2xx HTTP status.
    BadStatus,
    /// Missing or non-image content type.
    InvalidContentType,
    /// Local IO failure while persisting the body.
    WriteFailure,
    /// The fetch task panicked before producing an outcome.
    TaskPanicked,
    /// The fetch task was cancelled before producing an outcome.
    TaskAborted,
}

impl FailureKind {
    /// Stable label for logs and summaries.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::ConnectionFailure => "connection_failure",
            Self::BadStatus => "bad_status",
            Self::InvalidContentType => "invalid_content_type",
            Self::WriteFailure => "write_failure",
            Self::TaskPanicked => "task_panicked",
            Self::TaskAborted => "task_aborted",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
