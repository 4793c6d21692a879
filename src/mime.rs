//! Content-type to file-extension lookup and the set of recognized image types.
//!
//! The registry is built once before the worker pool starts and is shared
//! immutably (behind an `Arc`) by every fetch task. Nothing mutates it after
//! construction, so lookups need no synchronization.

use std::collections::{BTreeSet, HashMap};

/// Sentinel used when a response carries no `Content-Type` header.
///
/// It is never a member of the image set, so validation always fails for it.
pub const NO_CONTENT_TYPE: &str = "NONE";

/// Extension used when a content type passed the image check but has no
/// extension entry.
pub const DEFAULT_IMAGE_EXTENSION: &str = ".jpg";

/// Standard content types and their accepted extensions, canonical first.
const STANDARD_TYPES: &[(&str, &[&str])] = &[
    ("image/avif", &[".avif"]),
    ("image/bmp", &[".bmp"]),
    ("image/gif", &[".gif"]),
    ("image/heic", &[".heic"]),
    ("image/heif", &[".heif"]),
    ("image/ief", &[".ief"]),
    ("image/jpeg", &[".jpg", ".jpeg", ".jpe"]),
    ("image/png", &[".png"]),
    ("image/svg+xml", &[".svg"]),
    ("image/tiff", &[".tiff", ".tif"]),
    ("image/vnd.microsoft.icon", &[".ico"]),
    ("image/webp", &[".webp"]),
    ("image/x-cmu-raster", &[".ras"]),
    ("image/x-icon", &[".ico"]),
    ("image/x-ms-bmp", &[".bmp"]),
    ("image/x-portable-anymap", &[".pnm"]),
    ("image/x-portable-bitmap", &[".pbm"]),
    ("image/x-portable-graymap", &[".pgm"]),
    ("image/x-portable-pixmap", &[".ppm"]),
    ("image/x-rgb", &[".rgb"]),
    ("image/x-xbitmap", &[".xbm"]),
    ("image/x-xpixmap", &[".xpm"]),
    ("image/x-xwindowdump", &[".xwd"]),
    ("application/json", &[".json"]),
    ("application/pdf", &[".pdf"]),
    ("application/xml", &[".xml"]),
    ("application/zip", &[".zip"]),
    ("text/css", &[".css"]),
    ("text/html", &[".html", ".htm"]),
    ("text/plain", &[".txt"]),
    ("video/mp4", &[".mp4"]),
];

/// Read-only lookup table from content type to file extensions.
#[derive(Debug, Clone)]
pub struct MimeTypeRegistry {
    extensions: HashMap<String, Vec<String>>,
    image_types: BTreeSet<String>,
}

impl Default for MimeTypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl MimeTypeRegistry {
    /// Builds the registry from the built-in content-type table.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_entries(
            STANDARD_TYPES
                .iter()
                .map(|(content_type, exts)| (*content_type, exts.iter().copied())),
        )
    }

    /// Builds a registry from `(content_type, extensions)` pairs.
    ///
    /// Content types are lower-cased. Extensions are stored with a leading
    /// dot; the first extension of each entry is the canonical one. The image
    /// set is derived from every content type containing `image`.
    pub fn from_entries<'a, I, E>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, E)>,
        E: IntoIterator<Item = &'a str>,
    {
        let mut extensions: HashMap<String, Vec<String>> = HashMap::new();
        for (content_type, exts) in entries {
            let key = content_type.trim().to_ascii_lowercase();
            let slot = extensions.entry(key).or_default();
            for ext in exts {
                let ext = normalize_extension(ext);
                if !ext.is_empty() && !slot.contains(&ext) {
                    slot.push(ext);
                }
            }
        }
        let image_types = extensions
            .keys()
            .filter(|content_type| content_type.contains("image"))
            .cloned()
            .collect();
        Self {
            extensions,
            image_types,
        }
    }

    /// Returns true if the (already normalized) content type is a recognized image type.
    #[must_use]
    pub fn is_image(&self, content_type: &str) -> bool {
        self.image_types.contains(content_type)
    }

    /// Canonical extension (with leading dot) for a content type, if known.
    #[must_use]
    pub fn extension_for(&self, content_type: &str) -> Option<&str> {
        self.extensions
            .get(content_type)
            .and_then(|exts| exts.first())
            .map(String::as_str)
    }

    /// All accepted extensions for a content type, canonical first.
    #[must_use]
    pub fn extensions_for(&self, content_type: &str) -> &[String] {
        self.extensions
            .get(content_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterates over the recognized image content types in sorted order.
    pub fn image_types(&self) -> impl Iterator<Item = &str> {
        self.image_types.iter().map(String::as_str)
    }
}

/// Reduces a raw `Content-Type` header value to its bare, lower-cased type.
///
/// `image/JPEG; charset=binary` becomes `image/jpeg`. A missing or blank
/// header becomes [`NO_CONTENT_TYPE`].
#[must_use]
pub fn normalize_content_type(raw: Option<&str>) -> String {
    let bare = raw
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .unwrap_or_default();
    if bare.is_empty() {
        NO_CONTENT_TYPE.to_string()
    } else {
        bare.to_ascii_lowercase()
    }
}

fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.').to_ascii_lowercase();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{trimmed}")
    }
}
