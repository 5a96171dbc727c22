//! Shared User-Agent string for every request the pipeline makes.
//!
//! Catalog, landing page, payload and extraction traffic all go through one
//! transport, so they identify themselves the same way.

/// Project URL for User-Agent identification (RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/aptnotes/data";

/// Default User-Agent for pipeline requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("aptnotes-download/{version} (report-archiver; +{PROJECT_UA_URL})")
}
