//! Error types for the today-in-history feed

use thiserror::Error;

/// Result type for feed operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Errors that can occur while refreshing the feed
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("API request failed with status: {status}")]
    Api { status: u16 },

    #[error("Unexpected response format: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl HistoryError {
    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        HistoryError::Format(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        HistoryError::Config(msg.into())
    }
}

impl From<::config::ConfigError> for HistoryError {
    fn from(err: ::config::ConfigError) -> Self {
        HistoryError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(err: serde_json::Error) -> Self {
        HistoryError::Format(format!("invalid JSON: {}", err))
    }
}
