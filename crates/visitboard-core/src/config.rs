use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use visitboard_schedule::analysis::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use visitboard_store::retry::{DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_DELAY_MS, DEFAULT_MAX_RETRIES};
use visitboard_store::remote::DEFAULT_TIMEOUT_SECS;
use visitboard_store::RetryConfig;

/// Prefix for environment overrides, e.g. `VISITBOARD_STORE__BASE_URL`.
pub const ENV_PREFIX: &str = "VISITBOARD";
/// Read when the config file has no analysis key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Remote blob endpoint and local cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Key-value endpoint; documents live at `{base_url}/{bucket}_{key}`
    pub base_url: String,

    pub bucket: String,

    /// SQLite cache file. Defaults to the user data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_initial_delay_ms() -> u64 {
    DEFAULT_INITIAL_DELAY_MS
}

fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://kvdb.io/A4rY3qN6u1e5u7y9s9z2r".to_string(),
            bucket: "ruhi_care_v2_global_sync".to_string(),
            cache_path: None,
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl StoreConfig {
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::new(self.max_retries, self.initial_delay_ms, self.max_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured cache file, or `{data_dir}/visitboard/cache.db`.
    pub fn effective_cache_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("visitboard")
                .join("cache.db")
        })
    }
}

/// Poll intervals per document, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    pub events_secs: u64,
    pub settings_secs: u64,
    pub chat_secs: u64,
    pub users_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            events_secs: 5,
            settings_secs: 10,
            chat_secs: 3,
            users_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub password: String,
}

pub const DEFAULT_ADMIN_PASSWORD: &str = "2020";

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

/// Generative model used by `analyze`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// API key. When unset, `GEMINI_API_KEY` is read at startup and never
    /// written back to the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub model: String,

    pub base_url: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Key from the config file, else from the environment. Blank keys are unset.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path`, then apply `VISITBOARD_*` environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            Self::default().save_to(path)?;
        }

        let defaults = config::Config::try_from(&Self::default())
            .context("Failed to build default config")?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read config file")?;

        settings
            .try_deserialize()
            .context("Failed to parse config file")
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_url(&self.store.base_url, "store.base_url", &mut result);
        if self.store.bucket.trim().is_empty() {
            result.add_error("store.bucket", "Bucket name must not be empty");
        }
        if self.store.request_timeout_secs == 0 {
            result.add_error("store.request_timeout_secs", "Timeout must be greater than 0");
        }
        if self.store.max_delay_ms < self.store.initial_delay_ms {
            result.add_warning(
                "store.max_delay_ms",
                "Max retry delay is shorter than the initial delay",
            );
        }

        // Zero-length intervals cannot be scheduled
        let intervals = [
            ("polling.events_secs", self.polling.events_secs),
            ("polling.settings_secs", self.polling.settings_secs),
            ("polling.chat_secs", self.polling.chat_secs),
            ("polling.users_secs", self.polling.users_secs),
        ];
        for (field, secs) in intervals {
            if secs == 0 {
                result.add_error(field, "Poll interval must be greater than 0");
            } else if secs > 3600 {
                result.add_warning(field, "Poll interval is more than an hour");
            }
        }

        if self.admin.password.is_empty() {
            result.add_error("admin.password", "Admin password must not be empty");
        } else if self.admin.password == DEFAULT_ADMIN_PASSWORD {
            result.add_warning("admin.password", "Using the default admin password");
        }

        if self.analysis.resolved_api_key().is_none() {
            result.add_warning("analysis.api_key", "No API key - schedule analysis is disabled");
        }
        Self::validate_url(&self.analysis.base_url, "analysis.base_url", &mut result);

        result
    }

    fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }
                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// `{config_dir}/visitboard/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("visitboard");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.iter().any(|w| w.field == "admin.password"));
    }

    #[test]
    fn test_invalid_store_url() {
        let mut config = Config::default();
        config.store.base_url = "ftp://example.com".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_poll_interval() {
        let mut config = Config::default();
        config.polling.chat_secs = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "polling.chat_secs"));
    }

    #[test]
    fn test_empty_bucket_and_password() {
        let mut config = Config::default();
        config.store.bucket = " ".to_string();
        config.admin.password = String::new();
        let summary = config.validate().error_summary();
        assert!(summary.contains("store.bucket"));
        assert!(summary.contains("admin.password"));
    }

    #[test]
    fn test_load_creates_file_and_applies_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created.polling.events_secs, 5);

        std::fs::write(
            &path,
            "[store]\nbase_url = \"http://localhost:9000\"\nbucket = \"test\"\n\n[polling]\nevents_secs = 7\nsettings_secs = 10\nchat_secs = 3\nusers_secs = 10\n",
        )
        .unwrap();
        std::env::set_var("VISITBOARD_ADMIN__PASSWORD", "s3cret");
        let loaded = Config::load_from(&path).unwrap();
        std::env::remove_var("VISITBOARD_ADMIN__PASSWORD");

        assert_eq!(loaded.store.base_url, "http://localhost:9000");
        assert_eq!(loaded.store.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(loaded.polling.events_secs, 7);
        assert_eq!(loaded.admin.password, "s3cret");
    }

    #[test]
    fn test_env_api_key_is_not_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::env::set_var(API_KEY_ENV, "env-key");
        let created = Config::load_from(&path).unwrap();
        let resolved = created.analysis.resolved_api_key();
        std::env::remove_var(API_KEY_ENV);

        assert!(created.analysis.api_key.is_none());
        assert_eq!(resolved.as_deref(), Some("env-key"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("env-key"));
        assert!(!written.contains("api_key"));

        let from_file = AnalysisConfig {
            api_key: Some("file-key".into()),
            ..AnalysisConfig::default()
        };
        assert_eq!(from_file.resolved_api_key().as_deref(), Some("file-key"));
    }

    #[test]
    fn test_store_helpers() {
        let mut store = StoreConfig::default();
        assert_eq!(store.retry().max_retries, DEFAULT_MAX_RETRIES);
        assert!(store.effective_cache_path().ends_with("visitboard/cache.db"));
        store.cache_path = Some(PathBuf::from("/tmp/x.db"));
        assert_eq!(store.effective_cache_path(), PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
