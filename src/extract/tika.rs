//! Extraction through an Apache Tika server.
//!
//! The payload is sent with `PUT {base}/rmeta/text`. Tika answers with a JSON
//! array of metadata maps, the first one describing the container document.
//! Metadata values are either strings or arrays of strings.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::{debug, instrument};
use url::Url;

use super::{ExtractedFields, ExtractionError, Extractor};
use crate::fetch::{FetchError, HttpClient};

const CONTENT_KEY: &str = "X-TIKA:content";
const CREATED_KEYS: &[&str] = &["dcterms:created", "Creation-Date", "meta:creation-date"];
const TOOL_KEYS: &[&str] = &["pdf:docinfo:creator_tool", "xmp:CreatorTool"];
const TITLE_KEYS: &[&str] = &["pdf:docinfo:title", "dc:title"];

/// [`Extractor`] backed by a Tika server.
#[derive(Debug, Clone)]
pub struct TikaExtractor {
    client: HttpClient,
    endpoint: String,
}

impl TikaExtractor {
    /// Creates an extractor talking to the Tika server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if `base_url` is not an absolute URL.
    pub fn new(client: HttpClient, base_url: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(base_url)?;
        let endpoint = format!("{}/rmeta/text", base.as_str().trim_end_matches('/'));
        Ok(Self { client, endpoint })
    }

    /// Returns the full `rmeta/text` endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Extractor for TikaExtractor {
    fn name(&self) -> &str {
        "tika"
    }

    #[instrument(level = "debug", skip_all, fields(bytes = payload.len()))]
    async fn extract(&self, payload: Vec<u8>) -> Result<ExtractedFields, ExtractionError> {
        let response = self
            .client
            .put_bytes(&self.endpoint, payload, "application/json")
            .await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ExtractionError::Request(FetchError::body(&self.endpoint, e)))?;

        let documents: Vec<Map<String, Value>> = serde_json::from_slice(&body)
            .map_err(|e| ExtractionError::malformed(format!("tika response: {e}")))?;
        let container = documents
            .first()
            .ok_or_else(|| ExtractionError::malformed("tika returned no documents"))?;

        let fields = fields_from_metadata(container);
        debug!(
            chars = fields.text.len(),
            has_timestamp = fields.timestamp.is_some(),
            "tika extraction complete"
        );
        Ok(fields)
    }
}

/// Maps one Tika metadata object onto [`ExtractedFields`].
#[must_use]
pub fn fields_from_metadata(metadata: &Map<String, Value>) -> ExtractedFields {
    ExtractedFields {
        text: first_string(metadata, &[CONTENT_KEY])
            .map(|text| text.trim().to_string())
            .unwrap_or_default(),
        timestamp: first_string(metadata, CREATED_KEYS).map(normalize_timestamp),
        tool_name: first_string(metadata, TOOL_KEYS).map(str::to_string),
        tool_title: first_string(metadata, TITLE_KEYS).map(str::to_string),
    }
}

fn first_string<'a>(metadata: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| match metadata.get(*key)? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(values) => values.iter().find_map(Value::as_str),
        _ => None,
    })
}

/// Rewrites a creation date to RFC 3339 UTC, or keeps it verbatim.
fn normalize_timestamp(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return naive.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true);
    }
    raw.to_string()
}
