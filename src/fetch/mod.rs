//! Grid retrieval.
//!
//! A [`GridSource`] returns the raw cell values of a named range. The live
//! source is the Google Sheets values API; [`crate::storage::SnapshotSource`]
//! serves a previously saved snapshot instead.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::config::{RangeConfig, SheetConfig};
use crate::models::RawGrid;

/// Grids keyed by range name.
pub type SheetData = BTreeMap<String, RawGrid>;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Range '{0}' is not available")]
    MissingRange(String),
}

/// Something that can hand out the grid for a configured range.
#[async_trait]
pub trait GridSource: Send + Sync {
    /// Source identifier for logging.
    fn name(&self) -> &'static str;

    /// Fetch the raw values of one range.
    async fn fetch_range(&self, range: &RangeConfig) -> Result<RawGrid, FetchError>;
}

/// Body of a `values.get` response.
#[derive(Debug, Deserialize)]
struct ValueRange {
    /// Absent when the range is empty
    #[serde(default)]
    values: RawGrid,
}

/// Parse a `values.get` response body.
pub fn parse_value_range(body: &[u8]) -> Result<RawGrid, FetchError> {
    let range: ValueRange = serde_json::from_slice(body)?;
    Ok(range.values)
}

/// Client for the Sheets values API.
pub struct SheetsClient {
    client: Client,
    base_url: String,
    sheet_id: String,
    api_key: Option<String>,
}

impl SheetsClient {
    /// Create a client for the configured spreadsheet.
    pub fn new(config: &SheetConfig, api_key: Option<String>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("hearts-tracker/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            sheet_id: config.sheet_id.clone(),
            api_key,
        })
    }

    /// `{base}/v4/spreadsheets/{id}/values/{Page!A1:K2000}?key=...`
    pub fn values_url(&self, range: &RangeConfig) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.sheet_id.as_str(),
                "values",
                range.a1_notation().as_str(),
            ]);

        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }

        Ok(url)
    }
}

#[async_trait]
impl GridSource for SheetsClient {
    fn name(&self) -> &'static str {
        "sheets"
    }

    async fn fetch_range(&self, range: &RangeConfig) -> Result<RawGrid, FetchError> {
        let url = self.values_url(range)?;
        info!(
            "Loading range '{}' ({}) from sheet {}",
            range.name,
            range.a1_notation(),
            self.sheet_id
        );

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.bytes().await?;
        parse_value_range(&body)
    }
}

/// Outcome of fetching several ranges.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub data: SheetData,

    /// Ranges that failed, with the reason
    pub failures: Vec<(String, FetchError)>,
}

/// Fetch every range. A failing range is reported once and does not stop the rest.
pub async fn fetch_all(source: &dyn GridSource, ranges: &[RangeConfig]) -> FetchReport {
    let mut report = FetchReport::default();

    for range in ranges {
        match source.fetch_range(range).await {
            Ok(grid) => {
                info!(
                    "Range '{}': {} rows from {}",
                    range.name,
                    grid.len(),
                    source.name()
                );
                report.data.insert(range.name.clone(), grid);
            }
            Err(e) => {
                error!("Failed to load range '{}': {}", range.name, e);
                report.failures.push((range.name.clone(), e));
            }
        }
    }

    report
}
