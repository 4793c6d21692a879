//! Optional config file supplying CLI defaults.
//!
//! Format is a flat `key = value` subset of TOML:
//!
//! ```toml
//! dest = "./images"
//! workers = 64
//! check_content_type = true
//! connect_timeout_secs = 10
//! read_timeout_secs = 10
//! log_file = "image_dl.log"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use image_dl::MAX_WORKERS;

/// File-backed defaults. Every field is optional; CLI flags win over it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FileConfig {
    pub(crate) dest: Option<PathBuf>,
    pub(crate) workers: Option<usize>,
    pub(crate) check_content_type: Option<bool>,
    pub(crate) connect_timeout_secs: Option<u64>,
    pub(crate) read_timeout_secs: Option<u64>,
    pub(crate) log_file: Option<PathBuf>,
}

impl FileConfig {
    /// Validates config values against the CLI's accepted ranges.
    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(workers) = self.workers
            && !(1..=MAX_WORKERS).contains(&workers)
        {
            bail!("Invalid config value for `workers`: {workers}. Expected range: 1..={MAX_WORKERS}");
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/image-dl/config.toml`
/// 2. `$HOME/.config/image-dl/config.toml`
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("image-dl")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("image-dl")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads `explicit` if given, otherwise the default path when it exists.
///
/// A missing default file is not an error; a missing explicit file is.
pub(crate) fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    if let Some(path) = explicit {
        return read_file_config(path).map(Some);
    }
    match resolve_default_config_path() {
        Some(path) if path.exists() => read_file_config(&path).map(Some),
        _ => Ok(None),
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

pub(crate) fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let line_no = line_index + 1;

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "dest" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `dest` value on line {line_no}"))?;
                cfg.dest = Some(PathBuf::from(parsed));
            }
            "workers" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `workers` value on line {line_no}"))?;
                let workers = usize::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("workers out of range for usize"))?;
                cfg.workers = Some(workers);
            }
            "check_content_type" => {
                let parsed = parse_boolean(value).with_context(|| {
                    format!("Invalid `check_content_type` value on line {line_no}")
                })?;
                cfg.check_content_type = Some(parsed);
            }
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_no}")
                })?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "read_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `read_timeout_secs` value on line {line_no}")
                })?;
                cfg.read_timeout_secs = Some(parsed);
            }
            "log_file" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `log_file` value on line {line_no}"))?;
                cfg.log_file = Some(PathBuf::from(parsed));
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
