//! Landing page resolver for Box shared-item pages.
//!
//! Box serves an HTML shell whose last `<script>` starts with an assignment
//! of a JSON object. The `"/app-api/enduserapp/shared-item"` entry of that
//! object carries `sharedName` and `itemID`, from which the direct download
//! URL is built. The layout is not a documented API and may change.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{LocatorResolver, ResolveError};

/// Default host serving shared-item downloads.
pub const BOX_BASE_URL: &str = "https://app.box.com";

const SHARED_ITEM_KEY: &str = "/app-api/enduserapp/shared-item";

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>(.*?)</script\s*>")
        .unwrap_or_else(|e| panic!("invalid static regex: {e}"))
});

/// Resolves Box landing pages into `index.php?rm=box_download_shared_file` URLs.
#[derive(Debug, Clone)]
pub struct BoxSharedItemResolver {
    base: Url,
}

impl Default for BoxSharedItemResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl BoxSharedItemResolver {
    /// Creates a resolver building URLs against [`BOX_BASE_URL`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Url::parse(BOX_BASE_URL).unwrap_or_else(|e| panic!("invalid base URL: {e}")),
        }
    }

    /// Creates a resolver building URLs against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if `base` is not an absolute URL.
    pub fn with_base_url(base: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base)?,
        })
    }

    /// Builds the direct download URL for a shared item.
    #[must_use]
    pub fn build_download_url(&self, shared_name: &str, item_id: &str) -> String {
        let mut url = self.base.clone();
        url.set_path("/index.php");
        url.query_pairs_mut()
            .clear()
            .append_pair("rm", "box_download_shared_file")
            .append_pair("shared_name", shared_name)
            .append_pair("file_id", &format!("f_{item_id}"));
        url.into()
    }
}

impl LocatorResolver for BoxSharedItemResolver {
    fn name(&self) -> &str {
        "box-shared-item"
    }

    fn resolve(&self, landing_url: &str, page: &str) -> Result<String, ResolveError> {
        let body = page
            .find("<body")
            .or_else(|| page.find("<BODY"))
            .map_or(page, |start| &page[start..]);

        let script = SCRIPT_RE
            .captures_iter(body)
            .filter_map(|caps| caps.get(1))
            .last()
            .map(|m| m.as_str())
            .ok_or_else(|| ResolveError::ScriptNotFound {
                url: landing_url.to_string(),
            })?;

        let assignment = script.split(';').next().unwrap_or_default();
        let (_, blob) = assignment
            .split_once('=')
            .ok_or_else(|| ResolveError::malformed(landing_url, "script is not an assignment"))?;

        let value: Value = serde_json::from_str(blob.trim())
            .map_err(|e| ResolveError::malformed(landing_url, e.to_string()))?;

        let item = value
            .get(SHARED_ITEM_KEY)
            .ok_or_else(|| ResolveError::missing_field(landing_url, SHARED_ITEM_KEY))?;
        let shared_name = item
            .get("sharedName")
            .and_then(Value::as_str)
            .ok_or_else(|| ResolveError::missing_field(landing_url, "sharedName"))?;
        let item_id = match item.get("itemID") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(ResolveError::missing_field(landing_url, "itemID")),
        };

        let url = self.build_download_url(shared_name, &item_id);
        debug!(landing_url, download_url = %url, "resolved landing page");
        Ok(url)
    }
}

/// Renders a minimal landing page in the layout the resolver expects.
///
/// Used by tests and local fixtures.
#[must_use]
pub fn render_landing_page(shared_name: &str, item_id: &str) -> String {
    format!(
        "<html><head><script src=\"/app.js\"></script></head><body>\
         <div id=\"app\"></div>\
         <script>Box.postStreamData = {{\"{SHARED_ITEM_KEY}\":{{\"sharedName\":\"{shared_name}\",\"itemID\":\"{item_id}\"}}}};Box.init();</script>\
         </body></html>"
    )
}
