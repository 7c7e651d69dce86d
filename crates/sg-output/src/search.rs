//! Search-index sink (feature `search`).
//!
//! Talks to an Elasticsearch/OpenSearch-compatible bulk API over plain HTTP
//! using a blocking `ureq` agent.  One index per sensor type, named
//! `<prefix>-<slug>` (`sensor-temperature`, `sensor-wind`, …).
//!
//! The bulk endpoint accepts a batch even when individual documents fail;
//! those failures are counted in the returned [`WriteReport`] rather than
//! surfaced as an error.

use std::time::Duration;

use serde::Deserialize;
use sg_core::{Measurement, SensorType};
use tracing::{debug, info};

use crate::row::SearchDocument;
use crate::writer::{MeasurementSink, WriteReport};
use crate::{OutputError, OutputResult};

/// Connection settings for the search service.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Base URL, e.g. `http://localhost:9200`.
    pub url:          String,
    pub index_prefix: String,
    pub timeout:      Duration,
}

impl SearchConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url:          url.into(),
            index_prefix: "sensor".into(),
            timeout:      Duration::from_secs(10),
        }
    }

    /// Index name for `sensor_type`.
    pub fn index_name(&self, sensor_type: SensorType) -> String {
        format!("{}-{}", self.index_prefix, sensor_type.slug())
    }

    fn base(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

fn http_err(e: ureq::Error) -> OutputError {
    match e {
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            OutputError::Http(format!("status {code}: {}", body.trim()))
        }
        ureq::Error::Transport(t) => OutputError::Http(t.to_string()),
    }
}

/// Writes one sensor type's measurements into its index.
pub struct SearchSink {
    agent:       ureq::Agent,
    bulk_url:    String,
    index_url:   String,
    index:       String,
    sensor_type: SensorType,
}

impl SearchSink {
    /// # Errors
    ///
    /// `Config` if the URL is not `http://` or `https://`.
    pub fn new(config: &SearchConfig, sensor_type: SensorType) -> OutputResult<Self> {
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(OutputError::Config(format!(
                "search URL {:?} must start with http:// or https://",
                config.url
            )));
        }
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(concat!("sensorgen/", env!("CARGO_PKG_VERSION")))
            .build();
        let index = config.index_name(sensor_type);
        Ok(Self {
            agent,
            bulk_url: format!("{}/_bulk", config.base()),
            index_url: format!("{}/{}", config.base(), index),
            index,
            sensor_type,
        })
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Create the index if it does not exist.  Returns `true` if it was
    /// created by this call.
    pub fn ensure_index(&self) -> OutputResult<bool> {
        match self.agent.head(&self.index_url).call() {
            Ok(_) => {
                debug!(index = %self.index, "search index already exists");
                return Ok(false);
            }
            Err(ureq::Error::Status(404, _)) => {}
            Err(e) => return Err(http_err(e)),
        }
        self.agent.put(&self.index_url).call().map_err(http_err)?;
        info!(index = %self.index, "created search index");
        Ok(true)
    }

    fn bulk_body(&self, batch: &[Measurement]) -> OutputResult<String> {
        let action = serde_json::to_string(&serde_json::json!({ "index": { "_index": self.index } }))?;
        let mut body = String::with_capacity(batch.len() * 192);
        for m in batch {
            body.push_str(&action);
            body.push('\n');
            body.push_str(&serde_json::to_string(&SearchDocument::from(m))?);
            body.push('\n');
        }
        Ok(body)
    }
}

impl MeasurementSink for SearchSink {
    fn label(&self) -> &'static str {
        "search"
    }

    fn write_batch(&mut self, batch: &[Measurement]) -> OutputResult<WriteReport> {
        if batch.is_empty() {
            return Ok(WriteReport::default());
        }
        if let Some(m) = batch.iter().find(|m| m.sensor_type != self.sensor_type) {
            return Err(OutputError::WrongSensorType {
                sink:     "search",
                expected: self.sensor_type,
                got:      m.sensor_type,
            });
        }
        let body = self.bulk_body(batch)?;
        let resp = self
            .agent
            .post(&self.bulk_url)
            .set("Content-Type", "application/x-ndjson")
            .send_string(&body)
            .map_err(http_err)?;
        let text = resp.into_string()?;
        parse_bulk_response(&text, batch.len())
    }
}

// ── Bulk response ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items:  Vec<BulkItem>,
}

#[derive(Deserialize)]
struct BulkItem {
    #[serde(alias = "create")]
    index: Option<BulkItemResult>,
}

#[derive(Deserialize)]
struct BulkItemResult {
    #[serde(default)]
    status: u16,
    #[serde(default)]
    error:  Option<serde_json::Value>,
}

/// Count accepted and rejected documents in a bulk response body.
///
/// With `errors: false` every document of the batch counts as written.
/// Otherwise each item with an `error` or a non-2xx status counts as failed.
pub fn parse_bulk_response(body: &str, batch_len: usize) -> OutputResult<WriteReport> {
    let resp: BulkResponse = serde_json::from_str(body)?;
    if !resp.errors {
        return Ok(WriteReport::all(batch_len));
    }
    if resp.items.is_empty() {
        return Err(OutputError::Search("bulk request reported errors without item results".into()));
    }
    let failed = resp
        .items
        .iter()
        .filter(|item| match &item.index {
            Some(r) => r.error.is_some() || !(200..300).contains(&r.status),
            None => true,
        })
        .count()
        .min(batch_len);
    Ok(WriteReport {
        written: batch_len - failed,
        failed,
    })
}
