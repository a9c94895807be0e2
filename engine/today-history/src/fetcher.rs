use crate::config::ApiConfig;
use crate::error::{HistoryError, Result};
use crate::REQUEST_TIMEOUT_SECS;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

const USER_AGENT: &str = concat!("today-history/", env!("CARGO_PKG_VERSION"));

/// How much of an error body ends up in the log
const ERROR_BODY_SNIPPET: usize = 200;
const FORMAT_BODY_SNIPPET: usize = 500;

/// Source of raw history records for a calendar day
#[async_trait]
pub trait HistoryApi: Send + Sync {
    /// Fetch the raw `data.list` entries for the month/day of `date`
    async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<Value>>;
}

/// HTTP client for the today-in-history API
pub struct TodayHistoryFetcher {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl TodayHistoryFetcher {
    /// Create a new fetcher instance
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Self::with_timeout(config, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Create a fetcher whose requests give up after `timeout`
    pub fn with_timeout(config: &ApiConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| HistoryError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.key.clone(),
            base_url: config.base_url.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl HistoryApi for TodayHistoryFetcher {
    async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<Value>> {
        let date_param = query_date(date);

        info!("Fetching today-in-history list from: {}?key=<redacted>&date={}", self.base_url, date_param);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("key", self.api_key.as_str()), ("date", date_param.as_str())])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        debug!("Response status: {}, Content-Type: {}", status, content_type);

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        let list = parse_response(status, &content_type, &body)?;

        info!("Successfully fetched {} history entries for {}", list.len(), date_param);
        Ok(list)
    }
}

impl TodayHistoryFetcher {
    fn transport_error(&self, err: reqwest::Error) -> HistoryError {
        if err.is_timeout() {
            HistoryError::Timeout(self.timeout.as_secs())
        } else {
            // Drop the URL so the key does not leak into error messages.
            HistoryError::Network(err.without_url().to_string())
        }
    }
}

/// `MMDD` as expected by the `date` query parameter
pub fn query_date(date: NaiveDate) -> String {
    date.format("%m%d").to_string()
}

/// Validate an API response and extract the raw `data.list` entries.
///
/// A missing `data` or `data.list` yields an empty list; present but
/// wrongly-shaped values are format errors.
pub fn parse_response(status: StatusCode, content_type: &str, body: &str) -> Result<Vec<Value>> {
    if status != StatusCode::OK {
        error!("API request failed: {}, body: {}", status, snippet(body, ERROR_BODY_SNIPPET));
        return Err(HistoryError::Api { status: status.as_u16() });
    }

    if !content_type.contains("application/json") {
        error!("API returned non-JSON content: {}", snippet(body, FORMAT_BODY_SNIPPET));
        return Err(HistoryError::format(format!(
            "expected application/json, got '{}' (check the API key)",
            content_type
        )));
    }

    let payload: Value = serde_json::from_str(body).map_err(|e| {
        error!("JSON parse failed: {}, body: {}", e, snippet(body, FORMAT_BODY_SNIPPET));
        HistoryError::from(e)
    })?;

    let root = match payload.as_object() {
        Some(root) if !root.is_empty() => root,
        _ => {
            error!("API returned unexpected payload: {}", snippet(body, FORMAT_BODY_SNIPPET));
            return Err(HistoryError::format("response is not a non-empty JSON object"));
        }
    };

    let data = match root.get("data") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(data)) => data,
        Some(_) => return Err(HistoryError::format("'data' is not an object")),
    };

    match data.get("list") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(list)) => Ok(list.clone()),
        Some(_) => Err(HistoryError::format("'data.list' is not an array")),
    }
}

fn snippet(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
