//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use image_dl::DownloadConfig;

use crate::app_config::FileConfig;
use crate::logging::DEFAULT_LOG_FILE;

/// Destination folder when neither the CLI nor the config file names one.
pub(crate) const DEFAULT_DEST: &str = "images";

/// Fast bulk image downloader.
///
/// Reads URLs from arguments, --input, or stdin (one per line), downloads
/// them in parallel, and keeps only responses whose content type is an image.
#[derive(Parser, Debug)]
#[command(name = "image-dl")]
#[command(author, version, about)]
#[command(args_conflicts_with_subcommands = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Command>,

    #[command(flatten)]
    pub(crate) input: InputArgs,

    #[command(flatten)]
    pub(crate) common: CommonArgs,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Time the same batch across a range of worker counts
    Bench(BenchArgs),
}

/// Where URLs come from.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct InputArgs {
    /// URLs to download
    pub(crate) urls: Vec<String>,

    /// Read URLs from a file (one per line, `#` comments allowed)
    #[arg(short = 'i', long)]
    pub(crate) input: Option<PathBuf>,
}

/// Options shared by the download and bench commands.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct CommonArgs {
    /// Destination folder (created if missing) [default: images]
    #[arg(short = 'o', long, global = true)]
    pub(crate) dest: Option<PathBuf>,

    /// Concurrent workers (1-1024) [default: 8 x logical CPUs]
    #[arg(short = 'w', long, global = true, value_parser = clap::value_parser!(u16).range(1..=1024))]
    pub(crate) workers: Option<u16>,

    /// Save every successful response, whatever its content type
    #[arg(long, global = true)]
    pub(crate) no_check_content_type: bool,

    /// Connect and read timeout in seconds (1-3600) [default: 10]
    #[arg(short = 't', long, global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub(crate) timeout: Option<u64>,

    /// Append log lines to this file [default: image_dl.log]
    #[arg(long, global = true)]
    pub(crate) log_file: Option<PathBuf>,

    /// Log to stderr only
    #[arg(long, global = true, conflicts_with = "log_file")]
    pub(crate) no_log_file: bool,

    /// Read defaults from this config file instead of the XDG location
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, global = true)]
    pub(crate) no_progress: bool,

    /// Exit with status 1 if any download failed
    #[arg(long, global = true)]
    pub(crate) fail_on_error: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub(crate) quiet: bool,
}

#[derive(Args, Debug)]
pub(crate) struct BenchArgs {
    #[command(flatten)]
    pub(crate) input: InputArgs,

    /// First worker count
    #[arg(long, default_value_t = 1)]
    pub(crate) from: usize,

    /// Stop before this worker count
    #[arg(long, default_value_t = 50)]
    pub(crate) to: usize,

    /// Increment between runs
    #[arg(long, default_value_t = 5)]
    pub(crate) step: usize,

    /// Where to write the JSON timings
    #[arg(long, default_value = "speed_test_results.json")]
    pub(crate) results: PathBuf,
}

/// CLI flags merged over file config over built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedSettings {
    pub(crate) download: DownloadConfig,
    pub(crate) log_file: Option<PathBuf>,
}

impl CommonArgs {
    /// Merges these flags over `file`; `show_progress` comes from the caller's
    /// terminal check.
    pub(crate) fn resolve(&self, file: Option<&FileConfig>, show_progress: bool) -> ResolvedSettings {
        let file = file.cloned().unwrap_or_default();

        let dest = self
            .dest
            .clone()
            .or(file.dest)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DEST));
        let workers = self.workers.map(usize::from).or(file.workers);
        let check_content_type = !self.no_check_content_type && file.check_content_type.unwrap_or(true);

        let mut download = DownloadConfig::new(dest)
            .with_workers(workers)
            .with_check_content_type(check_content_type)
            .with_progress(show_progress && !self.no_progress);
        if let Some(secs) = self.timeout.or(file.connect_timeout_secs) {
            download = download.with_connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.timeout.or(file.read_timeout_secs) {
            download = download.with_read_timeout(Duration::from_secs(secs));
        }

        let log_file = if self.no_log_file {
            None
        } else {
            Some(
                self.log_file
                    .clone()
                    .or(file.log_file)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            )
        };

        ResolvedSettings { download, log_file }
    }
}
