//! Per-item input and output of the fetch pipeline.

use std::path::{Path, PathBuf};

use super::error::{FailureKind, FetchError};

/// One URL to fetch, with where and how to save it.
///
/// Built by the engine before dispatch and handed to exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    url: String,
    dest_dir: PathBuf,
    filename: Option<String>,
    check_content_type: bool,
}

impl DownloadTask {
    /// Creates a task that derives its filename from the URL and validates
    /// the content type.
    pub fn new(url: impl Into<String>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest_dir: dest_dir.into(),
            filename: None,
            check_content_type: true,
        }
    }

    /// Saves under `filename` instead of the name derived from the URL.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Enables or disables content-type validation.
    #[must_use]
    pub fn with_check_content_type(mut self, check: bool) -> Self {
        self.check_content_type = check;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    #[must_use]
    pub fn check_content_type(&self) -> bool {
        self.check_content_type
    }
}

/// A file written by a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// Final path, including any appended extension.
    pub path: PathBuf,
    /// Number of body bytes written.
    pub bytes: u64,
}

/// Why a task produced no file.
#[derive(Debug)]
pub enum TaskFailure {
    /// The fetcher reported a failure.
    Fetch(FetchError),
    /// The worker panicked; carries the panic description.
    Panicked(String),
    /// The worker stopped before fetching (cancelled or the pool closed).
    Aborted(String),
}

impl TaskFailure {
    /// Returns the failure category.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Fetch(error) => error.kind(),
            Self::Panicked(_) => FailureKind::TaskPanicked,
            Self::Aborted(_) => FailureKind::TaskAborted,
        }
    }
}

impl std::fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(error) => write!(f, "{error}"),
            Self::Panicked(message) => write!(f, "download task panicked: {message}"),
            Self::Aborted(reason) => write!(f, "download task aborted: {reason}"),
        }
    }
}

/// The single outcome of one [`DownloadTask`].
#[derive(Debug)]
pub struct DownloadResult {
    /// The URL this outcome belongs to.
    pub url: String,
    /// The saved file, or why there is none.
    pub outcome: Result<SavedFile, TaskFailure>,
}

impl DownloadResult {
    pub(crate) fn saved(url: impl Into<String>, saved: SavedFile) -> Self {
        Self {
            url: url.into(),
            outcome: Ok(saved),
        }
    }

    pub(crate) fn failed(url: impl Into<String>, error: FetchError) -> Self {
        Self {
            url: url.into(),
            outcome: Err(TaskFailure::Fetch(error)),
        }
    }

    pub(crate) fn panicked(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outcome: Err(TaskFailure::Panicked(message.into())),
        }
    }

    pub(crate) fn aborted(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outcome: Err(TaskFailure::Aborted(reason.into())),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Path of the written file, if the fetch succeeded.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.outcome.as_ref().ok().map(|saved| saved.path.as_path())
    }

    /// Failure category, if the fetch failed.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.outcome.as_ref().err().map(TaskFailure::kind)
    }
}
