//! Tracing setup: stderr plus an append-only log file.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Default log file, relative to the working directory.
pub(crate) const DEFAULT_LOG_FILE: &str = "image_dl.log";

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides `default_level`. When `log_file` cannot be opened,
/// logging continues on stderr only and a warning is emitted once the
/// subscriber is up.
pub(crate) fn init_logging(default_level: &str, log_file: Option<&Path>, no_color: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file, file_error) = match log_file.map(open_append) {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(!no_color),
        )
        .with(file_layer)
        .try_init();

    if let (Some(path), Some(e)) = (log_file, file_error) {
        warn!(path = %path.display(), error = %e, "could not open log file, logging to stderr only");
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Maps `-v`/`-q` flags to a filter directive.
pub(crate) fn level_for(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}
