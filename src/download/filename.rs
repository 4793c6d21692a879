//! Filename derivation, sanitization, and extension normalization.
//!
//! Derived names come from the last URL path segment. Two URLs that share a
//! last segment resolve to the same path; the later write replaces the earlier
//! file.

use std::path::{Component, Path, PathBuf};

use tracing::debug;
use url::Url;

use super::constants::FALLBACK_FILE_STEM;

/// Derives a filename from the last path segment of a URL.
///
/// The segment is percent-decoded, spaces become underscores, and characters
/// that are unsafe on common filesystems are replaced. A URL with an empty last
/// segment (`https://host/dir/`) gets a `download_<unix-seconds>` name.
pub(crate) fn filename_from_url(url: &Url) -> String {
    if let Some(mut segments) = url.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
            debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
            last.into()
        });
        return sanitize_filename(&decoded.replace(' ', "_"));
    }

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{FALLBACK_FILE_STEM}_{timestamp}")
}

/// Sanitizes a filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems
/// (`/ \ : * ? " < > |` and control characters). Names that would resolve to
/// `.` or `..` have their dots replaced so the result stays inside the
/// destination directory.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Appends `canonical` to the path unless its file name already ends with one
/// of the `accepted` extensions (compared case-insensitively).
pub(crate) fn ensure_extension(path: PathBuf, accepted: &[String], canonical: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let has_accepted = accepted
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(canonical))
        .any(|ext| name.ends_with(&ext.to_ascii_lowercase()));
    if has_accepted {
        return path;
    }

    let mut raw = path.into_os_string();
    raw.push(canonical);
    PathBuf::from(raw)
}
