//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/umami-beacon/config.toml`
//!
//! Two sources feed the tracker settings, mirroring how a web host exposes
//! them: the `[runtime]` table (overridable through `UMAMI_HOST` and
//! `UMAMI_ID`) and the `[umami]` app table carrying the full option set.
//! Values are kept raw here. Validation and defaulting happen in
//! [`crate::settings`].
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/umami-beacon/` (~/.config/umami-beacon/)
//! - State/Logs: `$XDG_STATE_HOME/umami-beacon/` (~/.local/state/umami-beacon/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Build mode; anything other than production keeps the debug sink on
    #[serde(default)]
    pub mode: Mode,

    /// Runtime-level source (`umami_host`, `umami_id`)
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// App-level source with the full option set (optional)
    #[serde(default)]
    pub umami: Option<UmamiOptions>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Build mode of the embedding application
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Production,
    Development,
}

impl Mode {
    /// Parse a mode name, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Mode::Production),
            "development" | "dev" => Some(Mode::Development),
            _ => None,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Mode::Production)
    }
}

/// Runtime-level configuration source
///
/// Takes precedence over the app-level `host` and `id` when valid.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RuntimeConfig {
    #[serde(default, deserialize_with = "lenient::string")]
    pub umami_host: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub umami_id: Option<String>,
}

/// App-level tracker options
///
/// Every field is optional. Values of the wrong type are read as absent
/// instead of failing the whole file.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct UmamiOptions {
    /// Collector base URL (e.g., `https://analytics.example.com`)
    #[serde(default, deserialize_with = "lenient::string")]
    pub host: Option<String>,

    /// Website id
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: Option<String>,

    /// Hostnames allowed to send beacons
    #[serde(default, deserialize_with = "lenient::strings")]
    pub domains: Option<Vec<String>>,

    /// Send even when the client asks not to be tracked
    #[serde(default, deserialize_with = "lenient::flag")]
    pub ignore_dnt: Option<bool>,

    /// Skip tracking on `localhost`
    #[serde(default, deserialize_with = "lenient::flag")]
    pub ignore_localhost: Option<bool>,

    /// Track a pageview on every navigation
    #[serde(default, deserialize_with = "lenient::flag")]
    pub auto_track: Option<bool>,

    /// Path replacing `/api/collect` or `/api/send`
    #[serde(default, deserialize_with = "lenient::string")]
    pub custom_endpoint: Option<String>,

    /// Collector API version (1 or 2)
    #[serde(default, deserialize_with = "lenient::number")]
    pub version: Option<u64>,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub use_directive: Option<bool>,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub debug: Option<bool>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Mirror log lines to stderr
    #[serde(default)]
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            stderr: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };

        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("failed to parse config: {}", e)))
    }

    /// Apply `UMAMI_HOST`, `UMAMI_ID` and `UMAMI_MODE` overrides from `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("UMAMI_HOST") {
            self.runtime.umami_host = Some(host);
        }
        if let Some(id) = lookup("UMAMI_ID") {
            self.runtime.umami_id = Some(id);
        }
        match lookup("UMAMI_MODE").as_deref().map(Mode::parse) {
            Some(Some(mode)) => self.mode = mode,
            Some(None) => tracing::warn!("Ignoring unknown UMAMI_MODE value"),
            None => {}
        }
        self
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/umami-beacon/config.toml` (~/.config/umami-beacon/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("umami-beacon").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/umami-beacon/` (~/.local/state/umami-beacon/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("umami-beacon")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join(crate::logging::LOG_FILE_NAME)
    }
}

/// Deserializers that read mistyped values as absent
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn strings<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        })
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => Some(b),
            _ => None,
        })
    }

    /// Non-negative integers, including integral floats such as `2.0`
    pub fn number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                    .map(|f| f as u64)
            }),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.mode, Mode::Production);
        assert!(config.umami.is_none());
        assert!(config.runtime.umami_host.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
mode = "development"

[runtime]
umami_host = "https://runtime.example.com"
umami_id = "runtime-id"

[umami]
host = "https://app.example.com"
id = "app-id"
domains = ["a.com", "b.com"]
ignore_dnt = false
ignore_localhost = true
custom_endpoint = "track"
version = 2

[logging]
level = "debug"
"#;
        let config = Config::parse(toml).unwrap();

        assert_eq!(config.mode, Mode::Development);
        assert_eq!(
            config.runtime.umami_host.as_deref(),
            Some("https://runtime.example.com")
        );
        let umami = config.umami.unwrap();
        assert_eq!(umami.id.as_deref(), Some("app-id"));
        assert_eq!(
            umami.domains,
            Some(vec!["a.com".to_string(), "b.com".to_string()])
        );
        assert_eq!(umami.ignore_dnt, Some(false));
        assert_eq!(umami.ignore_localhost, Some(true));
        assert_eq!(umami.version, Some(2));
        assert!(umami.auto_track.is_none());
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.stderr);
    }

    #[test]
    fn test_mistyped_values_read_as_absent() {
        let toml = r#"
[runtime]
umami_host = 42

[umami]
id = true
debug = "yes"
version = "2"
domains = "a.com"
"#;
        let config = Config::parse(toml).unwrap();
        assert!(config.runtime.umami_host.is_none());

        let umami = config.umami.unwrap();
        assert!(umami.id.is_none());
        assert!(umami.debug.is_none());
        assert!(umami.version.is_none());
        assert!(umami.domains.is_none());
    }

    #[test]
    fn test_integral_float_version() {
        let config = Config::parse("[umami]\nversion = 2.0\n").unwrap();
        assert_eq!(config.umami.unwrap().version, Some(2));

        let config = Config::parse("[umami]\nversion = 2.5\n").unwrap();
        assert!(config.umami.unwrap().version.is_none());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::parse("mode = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default().with_overrides(|key| match key {
            "UMAMI_HOST" => Some("https://env.example.com".to_string()),
            "UMAMI_ID" => Some("env-id".to_string()),
            "UMAMI_MODE" => Some("Dev".to_string()),
            _ => None,
        });

        assert_eq!(
            config.runtime.umami_host.as_deref(),
            Some("https://env.example.com")
        );
        assert_eq!(config.runtime.umami_id.as_deref(), Some("env-id"));
        assert_eq!(config.mode, Mode::Development);
    }

    #[test]
    fn test_unknown_mode_override_is_ignored() {
        let config = Config::default().with_overrides(|key| match key {
            "UMAMI_MODE" => Some("staging".to_string()),
            _ => None,
        });
        assert_eq!(config.mode, Mode::Production);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[umami]\nid = \"file-id\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.umami.unwrap().id.as_deref(), Some("file-id"));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
