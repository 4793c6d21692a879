//! CLI entry point for the image downloader.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use image_dl::bench::{run_worker_sweep, worker_range, write_results};
use image_dl::{BatchReport, DownloadConfig, DownloadEngine, MimeTypeRegistry, parse_url_list};
use tracing::{debug, info, warn};

mod app_config;
mod cli;
mod logging;

use cli::{BenchArgs, Cli, Command, InputArgs};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();
    let common = &cli.common;

    let file_config = app_config::load_file_config(common.config.as_deref())?;
    let show_progress = !common.quiet && io::stderr().is_terminal();
    let settings = common.resolve(file_config.as_ref(), show_progress);

    let default_level = logging::level_for(common.verbose, common.quiet);
    let no_color = std::env::var_os("NO_COLOR").is_some() || !io::stderr().is_terminal();
    logging::init_logging(default_level, settings.log_file.as_deref(), no_color);

    debug!(?cli, "CLI arguments parsed");

    let registry = Arc::new(MimeTypeRegistry::standard());
    let any_failed = match &cli.command {
        Some(Command::Bench(args)) => run_bench(args, &settings.download, registry).await?,
        None => run_download(&cli.input, &settings.download, registry).await?,
    };

    if any_failed && common.fail_on_error {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Downloads every input URL once. Returns whether any item failed.
async fn run_download(
    input: &InputArgs,
    config: &DownloadConfig,
    registry: Arc<MimeTypeRegistry>,
) -> Result<bool> {
    let Some(urls) = collect_urls(input)? else {
        return Ok(false);
    };

    let engine = DownloadEngine::from_config(config, registry)?;
    info!(
        urls = urls.len(),
        workers = engine.workers(),
        dest = %config.dest_dir().display(),
        check_content_type = engine.check_content_type(),
        "Downloader starting"
    );

    let report = engine.download_all(urls, config.dest_dir()).await;
    log_summary(&report);
    Ok(report.failed() > 0)
}

/// Runs the worker sweep and writes its timings. Returns whether any run had
/// a failed item.
async fn run_bench(
    args: &BenchArgs,
    config: &DownloadConfig,
    registry: Arc<MimeTypeRegistry>,
) -> Result<bool> {
    let worker_counts = worker_range(args.from, args.to, args.step)?;
    let Some(urls) = collect_urls(&args.input)? else {
        return Ok(false);
    };

    info!(
        urls = urls.len(),
        runs = worker_counts.len(),
        "Starting worker benchmark"
    );
    let results = run_worker_sweep(&urls, config, registry, &worker_counts).await?;
    write_results(&args.results, &results)?;
    info!(path = %args.results.display(), "Benchmark results written");

    Ok(results.values().any(|run| run.failed > 0))
}

/// Gathers URLs from positional args and `--input`, falling back to stdin when
/// it is piped. `None` means there was nothing to do.
fn collect_urls(input: &InputArgs) -> Result<Option<Vec<String>>> {
    let mut text = input.urls.join("\n");
    if let Some(path) = &input.input {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file '{}'", path.display()))?;
        text.push('\n');
        text.push_str(&contents);
    }

    if text.trim().is_empty() {
        if io::stdin().is_terminal() {
            info!("No input provided. Pipe URLs via stdin, pass them as arguments, or use --input.");
            info!("Example: echo 'https://example.com/cat.jpg' | image-dl -o ./images");
            return Ok(None);
        }
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read URLs from stdin")?;
    }

    let urls = parse_url_list(&text);
    if urls.is_empty() {
        info!("No URLs found in input");
        return Ok(None);
    }
    Ok(Some(urls))
}

fn log_summary(report: &BatchReport) {
    for (kind, count) in report.failure_counts() {
        warn!(kind = %kind, count, "Failed downloads");
    }
    info!(
        submitted = report.submitted(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Download complete"
    );
}
