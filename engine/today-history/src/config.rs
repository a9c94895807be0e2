//! Configuration for the today-in-history feed

use crate::error::{HistoryError, Result};
use crate::{
    DEFAULT_API_URL, DEFAULT_SCROLL_INTERVAL_SECS, MAX_SCROLL_INTERVAL_SECS,
    MIN_SCROLL_INTERVAL_SECS,
};
use ::config::{Config, Environment, File, Source};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "TODAY_HISTORY_CONFIG";

/// Config file looked up in the working directory when no path is given
const DEFAULT_CONFIG_NAME: &str = "today-history";

const ENV_PREFIX: &str = "TODAY_HISTORY";

/// Configuration for the feed service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TodayHistoryConfig {
    /// Upstream API configuration
    pub api: ApiConfig,

    /// Scroll view configuration
    pub display: DisplayConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API credential, sent as the `key` query parameter
    pub key: String,

    /// Endpoint queried with `key` and `date`
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Seconds between two scroll ticks
    pub scroll_interval_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { key: String::new(), base_url: DEFAULT_API_URL.to_string() }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { scroll_interval_secs: DEFAULT_SCROLL_INTERVAL_SECS }
    }
}

// The key must never end up in logs.
impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("key", &if self.key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TodayHistoryConfig {
    /// Load configuration from defaults, an optional TOML file and the environment.
    ///
    /// The file is taken from `TODAY_HISTORY_CONFIG` when set (and must exist),
    /// otherwise `today-history.toml` is used if present. Environment variables
    /// use the `TODAY_HISTORY_` prefix with `__` between section and field,
    /// e.g. `TODAY_HISTORY_API__KEY` or `TODAY_HISTORY_DISPLAY__SCROLL_INTERVAL_SECS`.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        Self::load_from(path.as_deref())
    }

    /// Load configuration using an explicit file path
    pub fn load_from(path: Option<&str>) -> Result<Self> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };
        Self::from_layers(file)
    }

    fn from_layers<S>(file: S) -> Result<Self>
    where
        S: Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.api.key.trim().is_empty() {
            return Err(HistoryError::config(format!(
                "API key is required (set {}_API__KEY or api.key)",
                ENV_PREFIX
            )));
        }

        if self.api.base_url.trim().is_empty() {
            return Err(HistoryError::config("api.base_url must not be empty"));
        }

        let interval = self.display.scroll_interval_secs;
        if !(MIN_SCROLL_INTERVAL_SECS..=MAX_SCROLL_INTERVAL_SECS).contains(&interval) {
            return Err(HistoryError::config(format!(
                "display.scroll_interval_secs must be within {}..={}, got {}",
                MIN_SCROLL_INTERVAL_SECS, MAX_SCROLL_INTERVAL_SECS, interval
            )));
        }

        Ok(())
    }

    /// Get scroll interval as Duration
    pub fn scroll_interval(&self) -> Duration {
        Duration::from_secs(self.display.scroll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::config::FileFormat;
    use std::io::Write;

    fn valid_config() -> TodayHistoryConfig {
        let mut config = TodayHistoryConfig::default();
        config.api.key = "test-key".to_string();
        config
    }

    #[test]
    fn test_default_values() {
        let config = TodayHistoryConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.display.scroll_interval_secs, DEFAULT_SCROLL_INTERVAL_SECS);
        assert_eq!(config.scroll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let config = TodayHistoryConfig::default();
        assert!(matches!(config.validate(), Err(HistoryError::Config(_))));

        let mut blank = valid_config();
        blank.api.key = "   ".to_string();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_scroll_interval_bounds() {
        let mut config = valid_config();

        for ok in [MIN_SCROLL_INTERVAL_SECS, 60, MAX_SCROLL_INTERVAL_SECS] {
            config.display.scroll_interval_secs = ok;
            assert!(config.validate().is_ok(), "{} should be accepted", ok);
        }

        for bad in [0, MIN_SCROLL_INTERVAL_SECS - 1, MAX_SCROLL_INTERVAL_SECS + 1] {
            config.display.scroll_interval_secs = bad;
            assert!(config.validate().is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_file_layer_overrides_defaults() {
        let toml = r#"
            [api]
            key = "from-file"

            [display]
            scroll_interval_secs = 45
        "#;

        let config =
            TodayHistoryConfig::from_layers(File::from_str(toml, FileFormat::Toml)).unwrap();
        assert_eq!(config.api.key, "from-file");
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.display.scroll_interval_secs, 45);
    }

    #[test]
    fn test_file_layer_is_validated() {
        let toml = r#"
            [api]
            key = "from-file"

            [display]
            scroll_interval_secs = 1
        "#;

        let result = TodayHistoryConfig::from_layers(File::from_str(toml, FileFormat::Toml));
        assert!(matches!(result, Err(HistoryError::Config(_))));
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[api]\nkey = \"on-disk\"\nbase_url = \"http://localhost:9000/history\"")
            .unwrap();

        let config = TodayHistoryConfig::load_from(file.path().to_str()).unwrap();
        assert_eq!(config.api.key, "on-disk");
        assert_eq!(config.api.base_url, "http://localhost:9000/history");
    }

    #[test]
    fn test_load_from_missing_explicit_path_fails() {
        let result = TodayHistoryConfig::load_from(Some("/nonexistent/today-history.toml"));
        assert!(matches!(result, Err(HistoryError::Config(_))));
    }

    #[test]
    fn test_debug_output_redacts_key() {
        let config = valid_config();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("test-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
