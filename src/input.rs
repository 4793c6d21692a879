//! URL list parsing for text input (files, stdin, arguments).

/// Splits text into URLs, one per line.
///
/// Lines are trimmed; blank lines and lines starting with `#` are skipped.
/// Order and duplicates are preserved. Nothing is validated here; a malformed
/// URL becomes a failed download like any other.
#[must_use]
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}
