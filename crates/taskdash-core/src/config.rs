use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable holding the browser cookie string (session + CSRF).
pub const COOKIE_ENV_VAR: &str = "TASKDASH_COOKIE";

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

    /// Get a user-friendly message summarizing all errors
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
    /// Task backend connection
    #[serde(default)]
    pub service: ServiceConfig,

    /// Task list presentation
    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the dashboard serving `/api/todos/`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Raw `Cookie` header value (session and CSRF cookies).
    ///
    /// Falls back to the `TASKDASH_COOKIE` environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,

    /// Name of the cookie carrying the CSRF token
    #[serde(default = "default_csrf_cookie_name")]
    pub csrf_cookie_name: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Set when `cookie` was taken from the environment; such a cookie is
    /// never written back to the file.
    #[serde(skip)]
    cookie_from_env: bool,
}

impl ServiceConfig {
    /// Fill an unset cookie from `TASKDASH_COOKIE`.
    fn apply_env_cookie(&mut self) {
        if self.cookie.is_none() {
            self.cookie = std::env::var(COOKIE_ENV_VAR).ok();
            self.cookie_from_env = self.cookie.is_some();
        }
    }

    /// Replace the cookie for this run only; it is not persisted.
    pub fn override_cookie(&mut self, cookie: impl Into<String>) {
        self.cookie = Some(cookie.into());
        self.cookie_from_env = true;
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string() // Django dev server
}

fn default_csrf_cookie_name() -> String {
    "csrftoken".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cookie: None,
            csrf_cookie_name: default_csrf_cookie_name(),
            request_timeout_secs: default_request_timeout_secs(),
            cookie_from_env: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Header text shown above the list; the done/total count is appended
    #[serde(default = "default_header_label")]
    pub header_label: String,

    /// Delay between the exit transition and the delete request
    #[serde(default = "default_delete_delay_ms")]
    pub delete_delay_ms: u64,

    /// How long a freshly added row stays in its entrance state
    #[serde(default = "default_entrance_ms")]
    pub entrance_ms: u64,
}

fn default_header_label() -> String {
    "To-Do".to_string()
}

fn default_delete_delay_ms() -> u64 {
    250
}

fn default_entrance_ms() -> u64 {
    300
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            header_label: default_header_label(),
            delete_delay_ms: default_delete_delay_ms(),
            entrance_ms: default_entrance_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there on first use
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&contents).context("Failed to parse config file")?
        } else {
            let config = Self::default();
            config.save_to(path)?;
            config
        };

        config.service.apply_env_cookie();

        Ok(config)
    }

    /// Validate, failing on errors and logging warnings.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let result = self.validate();
        if !result.is_valid() {
            return Err(ConfigError::Invalid(result.error_summary()));
        }

        for warning in &result.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(self)
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_url(&self.service.base_url, "service.base_url", &mut result);

        if self.service.request_timeout_secs == 0 {
            result.add_error(
                "service.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.service.csrf_cookie_name.trim().is_empty() {
            result.add_error("service.csrf_cookie_name", "Cookie name cannot be empty");
        }

        if self.service.cookie.is_none() {
            result.add_warning(
                "service.cookie",
                "No cookie configured - requests will be anonymous and lack a CSRF token",
            );
        }

        if self.ui.header_label.trim().is_empty() {
            result.add_error("ui.header_label", "Header label cannot be empty");
        }

        if self.ui.delete_delay_ms > 5000 {
            result.add_warning(
                "ui.delete_delay_ms",
                "Delete delay is unusually long (>5s)",
            );
        }

        if self.ui.entrance_ms > 5000 {
            result.add_warning("ui.entrance_ms", "Entrance duration is unusually long (>5s)");
        }

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

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = if self.service.cookie_from_env {
            let mut persisted = self.clone();
            persisted.service.cookie = None;
            toml::to_string_pretty(&persisted)
        } else {
            toml::to_string_pretty(self)
        }
        .context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("taskdash");

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
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.service.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "service.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.service.base_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_timeout_is_error() {
        let mut config = Config::default();
        config.service.request_timeout_secs = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result
            .errors
            .iter()
            .any(|e| e.field == "service.request_timeout_secs"));
    }

    #[test]
    fn test_missing_cookie_is_warning() {
        let mut config = Config::default();
        config.service.cookie = None;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "service.cookie"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[service]\nbase_url = \"https://dash.example.edu\"\n\n[ui]\ndelete_delay_ms = 100\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.service.base_url, "https://dash.example.edu");
        assert_eq!(config.service.csrf_cookie_name, "csrftoken");
        assert_eq!(config.service.request_timeout_secs, 30);
        assert_eq!(config.ui.delete_delay_ms, 100);
        assert_eq!(config.ui.entrance_ms, 300);
        assert_eq!(config.ui.header_label, "To-Do");
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.service.base_url, "http://localhost:8000");

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.ui.delete_delay_ms, config.ui.delete_delay_ms);
    }

    #[test]
    fn test_validated_rejects_errors() {
        let mut config = Config::default();
        config.service.base_url = "ftp://localhost".to_string();
        let err = config.validated().unwrap_err();
        assert!(matches!(&err, ConfigError::Invalid(msg) if msg.contains("service.base_url")));
    }

    #[test]
    fn test_validated_passes_warnings() {
        let mut config = Config::default();
        config.ui.entrance_ms = 10_000;
        let config = config.validated().unwrap();
        assert_eq!(config.ui.entrance_ms, 10_000);
    }

    #[test]
    fn test_overridden_cookie_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.service.override_cookie("sessionid=cli");
        config.save_to(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("sessionid=cli"));
        assert_eq!(config.service.cookie.as_deref(), Some("sessionid=cli"));
    }

    // The only test in this crate that touches TASKDASH_COOKIE.
    #[test]
    fn test_env_cookie_stays_out_of_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::env::set_var(COOKIE_ENV_VAR, "sessionid=first; csrftoken=old");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.service.cookie.as_deref(),
            Some("sessionid=first; csrftoken=old")
        );
        let written: toml::Value = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(written["service"].get("cookie").is_none(), "cookie written to disk");

        config.save_to(&path).unwrap();
        assert!(!std::fs::read_to_string(&path).unwrap().contains("sessionid"));

        std::env::set_var(COOKIE_ENV_VAR, "sessionid=second; csrftoken=new");
        let reloaded = Config::load_from(&path).unwrap();
        std::env::remove_var(COOKIE_ENV_VAR);
        assert_eq!(
            reloaded.service.cookie.as_deref(),
            Some("sessionid=second; csrftoken=new")
        );
    }

    #[test]
    fn test_file_cookie_wins_over_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[service]\ncookie = \"csrftoken=file\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.service.cookie.as_deref(), Some("csrftoken=file"));

        config.save_to(&path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("csrftoken=file"));
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
