//! Mock APTnotes deployment: catalog, Box landing pages and payloads, all
//! served by one wiremock server.

use std::io;
use std::net::TcpListener;
use std::path::Path;
use std::sync::{Arc, Mutex};

use aptnotes_core::resolver::render_landing_page;
use aptnotes_core::{
    BoxSharedItemResolver, CatalogRecord, LocatorResolver, OutputFormat, PipelineConfig, sha1_hex,
};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

pub const CATALOG_PATH: &str = "/APTnotes.json";

/// Set to `1` to turn a missing localhost socket into a failure.
const REQUIRE_SOCKETS_ENV: &str = "APTNOTES_REQUIRE_SOCKET_TESTS";

/// Starts a mock server, or returns `None` in sandboxes that cannot bind
/// localhost (unless `APTNOTES_REQUIRE_SOCKET_TESTS=1`).
pub async fn start_mock_server() -> Option<MockServer> {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return Some(MockServer::start().await);
    }
    let required = std::env::var(REQUIRE_SOCKETS_ENV).is_ok_and(|value| value == "1");
    assert!(!required, "cannot bind a localhost socket and {REQUIRE_SOCKETS_ENV}=1");
    eprintln!("skipping mock-server test: cannot bind a localhost socket");
    None
}

/// One report as published in the catalog.
#[derive(Debug, Clone)]
pub struct Report {
    pub name: String,
    pub payload: Vec<u8>,
    pub published_sha1: String,
    pub landing: Landing,
}

/// How the report's landing page behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    Resolvable,
    NotFound,
    NoScript,
}

impl Report {
    /// A healthy report whose payload matches its published digest.
    pub fn new(name: &str) -> Self {
        let payload = format!("%PDF-1.4\n{name} body\n%%EOF").into_bytes();
        Self {
            name: name.to_string(),
            published_sha1: sha1_hex(&payload),
            payload,
            landing: Landing::Resolvable,
        }
    }

    /// A report whose served payload never matches the published digest.
    pub fn corrupted(name: &str) -> Self {
        Self {
            published_sha1: sha1_hex(b"the bytes that were published"),
            ..Self::new(name)
        }
    }

    /// A report whose landing page cannot be resolved.
    pub fn unresolvable(name: &str, landing: Landing) -> Self {
        Self {
            landing,
            ..Self::new(name)
        }
    }

    pub fn landing_path(&self) -> String {
        format!("/s/{}", self.name)
    }

    pub fn item_id(&self) -> String {
        hex::encode(self.name.as_bytes())
    }

    /// The normalized record the catalog loader would produce at `sequence_id`.
    pub fn catalog_record(&self, server: &MockServer, sequence_id: u64) -> CatalogRecord {
        CatalogRecord {
            sequence_id,
            filename: self.name.clone(),
            title: format!("{} report", self.name),
            source: "Test Vendor".to_string(),
            landing_url: format!("{}{}", server.uri(), self.landing_path()),
            expected_digest: self.published_sha1.clone(),
            published_date: "02/18/2013".to_string(),
        }
    }

    pub fn catalog_entry(&self, server: &MockServer) -> Value {
        json!({
            "Filename": self.name,
            "Title": format!("{} report", self.name),
            "Source": "Test Vendor",
            "Link": format!("{}{}", server.uri(), self.landing_path()),
            "SHA-1": self.published_sha1,
            "Date": "02/18/2013",
            "Year": "2013",
        })
    }
}

/// Builds `count` healthy reports named `r0..r{count-1}`.
pub fn reports(count: usize) -> Vec<Report> {
    (0..count).map(|i| Report::new(&format!("r{i}"))).collect()
}

pub async fn mount_catalog(server: &MockServer, reports: &[Report]) {
    let entries: Vec<Value> = reports.iter().map(|r| r.catalog_entry(server)).collect();
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain; charset=utf-8")
                .set_body_json(entries),
        )
        .mount(server)
        .await;
}

/// Mounts the landing page for `report`.
pub async fn mount_landing(server: &MockServer, report: &Report) {
    let landing = match report.landing {
        Landing::Resolvable => ResponseTemplate::new(200)
            .insert_header("content-type", "text/html; charset=utf-8")
            .set_body_string(render_landing_page(&report.name, &report.item_id())),
        Landing::NotFound => ResponseTemplate::new(404),
        Landing::NoScript => ResponseTemplate::new(200)
            .insert_header("content-type", "text/html")
            .set_body_string("<html><body><p>This item has been removed.</p></body></html>"),
    };
    Mock::given(method("GET"))
        .and(path(report.landing_path()))
        .respond_with(landing)
        .mount(server)
        .await;
}

/// Matches payload downloads of `report`; the caller picks the response.
pub fn payload_request(report: &Report) -> MockBuilder {
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("rm", "box_download_shared_file"))
        .and(query_param("shared_name", report.name.as_str()))
}

pub fn payload_response(payload: &[u8]) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/pdf")
        .set_body_bytes(payload.to_vec())
}

/// Mounts the landing page and payload for `report`.
///
/// `payload_hits` sets an exact expectation on payload requests, verified
/// when the server drops.
pub async fn mount_report(server: &MockServer, report: &Report, payload_hits: Option<u64>) {
    mount_landing(server, report).await;
    let mut payload = payload_request(report).respond_with(payload_response(&report.payload));
    if let Some(hits) = payload_hits {
        payload = payload.expect(hits);
    }
    payload.mount(server).await;
}

/// Mounts the catalog plus every report.
pub async fn mount_deployment(server: &MockServer, reports: &[Report]) {
    mount_catalog(server, reports).await;
    for report in reports {
        mount_report(server, report, None).await;
    }
}

pub fn resolver(server: &MockServer) -> Arc<dyn LocatorResolver> {
    Arc::new(
        BoxSharedItemResolver::with_base_url(&server.uri())
            .unwrap_or_else(|e| panic!("mock server URI is not a URL: {e}")),
    )
}

pub fn config(server: &MockServer, format: OutputFormat, output: &Path) -> PipelineConfig {
    PipelineConfig::new(format, output)
        .with_catalog_url(format!("{}{CATALOG_PATH}", server.uri()))
        .with_timeouts(5, 10)
}

/// Reads the rows of a JSON sink output, sorted by `unique_id`.
pub fn read_json_rows(path: &Path) -> Vec<Value> {
    let bytes =
        std::fs::read(path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    let mut rows: Vec<Value> =
        serde_json::from_slice(&bytes).unwrap_or_else(|e| panic!("invalid JSON output: {e}"));
    rows.sort_by_key(|row| row["unique_id"].as_u64());
    rows
}

/// In-memory log sink for asserting on emitted events.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Installs a thread-local subscriber writing into this buffer.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
