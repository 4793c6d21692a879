//! User-Agent string sent with every fetch.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/sdtblck/image-dl";

/// Default User-Agent for download requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("image-dl/{version} (+{PROJECT_UA_URL})")
}
