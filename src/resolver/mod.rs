//! Landing page resolution.
//!
//! Catalog entries point at landing pages, not at payloads. A
//! [`LocatorResolver`] receives the landing page body and returns the real
//! download URL. The scraping heuristic is swappable:
//!
//! - [`BoxSharedItemResolver`] - the default, for Box shared-item pages
//! - any `Fn(&str, &str) -> Result<String, ResolveError>` closure
//!
//! # Example
//!
//! ```
//! use aptnotes_core::resolver::{BoxSharedItemResolver, LocatorResolver, render_landing_page};
//!
//! let resolver = BoxSharedItemResolver::new();
//! let url = resolver
//!     .resolve("https://app.box.com/s/abc", &render_landing_page("abc", "1"))
//!     .unwrap();
//! assert!(url.contains("file_id=f_1"));
//! ```

mod box_shared;
mod error;

pub use box_shared::{BOX_BASE_URL, BoxSharedItemResolver, render_landing_page};
pub use error::ResolveError;

/// Turns a landing page body into a final download URL.
///
/// Implementations are pure: the page is fetched by the download stage and
/// handed over, so resolvers never touch the network or the limiter.
pub trait LocatorResolver: Send + Sync {
    /// Returns the resolver's name, used in logs.
    fn name(&self) -> &str;

    /// Extracts the download URL from `page`, fetched from `landing_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when the page does not carry a usable locator.
    fn resolve(&self, landing_url: &str, page: &str) -> Result<String, ResolveError>;
}

impl<F> LocatorResolver for F
where
    F: Fn(&str, &str) -> Result<String, ResolveError> + Send + Sync,
{
    fn name(&self) -> &str {
        "custom"
    }

    fn resolve(&self, landing_url: &str, page: &str) -> Result<String, ResolveError> {
        self(landing_url, page)
    }
}
