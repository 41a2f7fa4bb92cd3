//! Google Sheets values API client (`GET {base}/{sheet}/values/{tab}`).
//!
//! Exposes a single `fetch_table` call returning a [`Table`] snapshot. All
//! wire types are private to this module — callers never see the values
//! API shapes. Authentication is an optional API key sent as the `key`
//! query parameter; it comes from the environment, never from config files.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use crate::config::SheetsConfig;
use crate::error::AppError;

// ── Table snapshot ────────────────────────────────────────────────────────────

/// One worksheet, snapshotted as trimmed headers plus string rows.
///
/// Every row is padded to the header width so column indexing never goes
/// out of bounds on ragged sheets.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from raw rows; the first row becomes the headers.
    pub fn from_rows(mut raw: Vec<Vec<String>>) -> Self {
        if raw.is_empty() {
            return Self {
                headers: vec![],
                rows: vec![],
            };
        }
        let headers: Vec<String> = raw.remove(0).iter().map(|h| h.trim().to_string()).collect();
        let width = headers.len();
        let rows = raw
            .into_iter()
            .map(|mut row| {
                row.truncate(width);
                while row.len() < width {
                    row.push(String::new());
                }
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a header, matched case-insensitively after trimming.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        let wanted = header.trim().to_lowercase();
        self.headers
            .iter()
            .position(|h| h.to_lowercase() == wanted)
    }

    /// Cell at (row, column), if both exist.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).map(|s| s.as_str())
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

/// Values API response body. Cells arrive loosely typed (strings, numbers,
/// booleans), so they are coerced to strings on ingest.
#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ── Client ───────────────────────────────────────────────────────────────────

/// HTTP client for the Sheets v4 values API.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    client: Client,
    api_base_url: String,
    api_key: Option<String>,
}

impl SheetsClient {
    pub fn new(config: &SheetsConfig, api_key: Option<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Sheets(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Fetch one worksheet tab as a [`Table`].
    pub async fn fetch_table(&self, sheet_id: &str, tab: &str) -> Result<Table, AppError> {
        if sheet_id.is_empty() {
            return Err(AppError::Sheets("no sheet id configured".into()));
        }

        let url = format!(
            "{}/{}/values/{}",
            self.api_base_url,
            sheet_id,
            urlencoding::encode(tab)
        );

        debug!(%sheet_id, %tab, "fetching worksheet");

        let mut req = self.client.get(&url);
        if let Some(key) = &self.api_key {
            req = req.query(&[("key", key.as_str())]);
        }

        let response = req.send().await.map_err(|e| {
            error!(%url, error = %e, "sheets request failed (transport)");
            AppError::Sheets(format!("request failed for tab '{tab}': {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| String::new());
            let snippet: String = body.chars().take(200).collect();
            error!(%status, %tab, "sheets request rejected");
            return Err(AppError::Sheets(format!(
                "status {status} for tab '{tab}': {snippet}"
            )));
        }

        let parsed = response.json::<ValueRange>().await.map_err(|e| {
            AppError::Sheets(format!("failed to parse values for tab '{tab}': {e}"))
        })?;

        let rows: Vec<Vec<String>> = parsed
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();

        let table = Table::from_rows(rows);
        debug!(rows = table.rows().len(), cols = table.headers().len(), %tab, "worksheet loaded");
        Ok(table)
    }
}
