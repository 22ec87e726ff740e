//! Settings normalization
//!
//! Merges the runtime and app configuration sources into one validated
//! [`Settings`] record. Invalid input never fails: it degrades to the
//! absent/default state.
//!
//! | field             | source                         | default  |
//! |-------------------|--------------------------------|----------|
//! | `host`            | runtime `umami_host`, app `host` | `None` |
//! | `id`              | runtime `umami_id`, app `id`   | `""`     |
//! | `domains`         | app                            | `None`   |
//! | `ignore_dnt`      | app                            | `true`   |
//! | `ignore_local`    | app `ignore_localhost`         | `false`  |
//! | `auto_track`      | app                            | `true`   |
//! | `custom_endpoint` | app                            | `None`   |
//! | `version`         | app, forced to 2 on umami.is   | `1`      |
//! | `use_directive`   | app                            | `false`  |
//! | `debug`           | app                            | `false`  |

use std::fmt;

use reqwest::Url;
use serde::Serialize;

use crate::config::{RuntimeConfig, UmamiOptions};

/// Hostname fragment of the hosted collector, which only speaks v2
const HOSTED_COLLECTOR: &str = "umami.is";

/// Collector API generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum CollectorVersion {
    /// `/api/collect`, `pageview` and `event` payload types
    #[default]
    V1,
    /// `/api/send`, everything is an `event`
    V2,
}

impl CollectorVersion {
    /// Default collector path for this version
    pub fn default_path(&self) -> &'static str {
        match self {
            CollectorVersion::V1 => "/api/collect",
            CollectorVersion::V2 => "/api/send",
        }
    }

    fn from_configured(value: Option<u64>) -> Self {
        match value {
            Some(2) => CollectorVersion::V2,
            _ => CollectorVersion::V1,
        }
    }
}

impl fmt::Display for CollectorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectorVersion::V1 => write!(f, "1"),
            CollectorVersion::V2 => write!(f, "2"),
        }
    }
}

/// Normalized tracker settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Validated collector base URL
    pub host: Option<Url>,
    pub id: String,
    pub domains: Option<Vec<String>>,
    pub ignore_dnt: bool,
    pub ignore_local: bool,
    pub auto_track: bool,
    /// Always starts with `/` and is never just `/`
    pub custom_endpoint: Option<String>,
    pub version: CollectorVersion,
    pub use_directive: bool,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_sources(None, None)
    }
}

impl Settings {
    /// Merge the runtime and app sources
    pub fn from_sources(runtime: Option<&RuntimeConfig>, app: Option<&UmamiOptions>) -> Self {
        let defaults = UmamiOptions::default();
        let app = app.unwrap_or(&defaults);

        let runtime_host = runtime.and_then(|r| valid_string(r.umami_host.as_deref()));
        let runtime_id = runtime.and_then(|r| valid_string(r.umami_id.as_deref()));

        let host = runtime_host
            .or_else(|| valid_string(app.host.as_deref()))
            .and_then(parse_host);

        let id = runtime_id
            .or_else(|| valid_string(app.id.as_deref()))
            .unwrap_or_default()
            .to_string();

        let version = match &host {
            Some(url) if is_hosted_collector(url) => CollectorVersion::V2,
            _ => CollectorVersion::from_configured(app.version),
        };

        Self {
            host,
            id,
            domains: normalize_domains(app.domains.as_deref()),
            ignore_dnt: app.ignore_dnt.unwrap_or(true),
            ignore_local: app.ignore_localhost.unwrap_or(false),
            auto_track: app.auto_track.unwrap_or(true),
            custom_endpoint: normalize_endpoint(app.custom_endpoint.as_deref()),
            version,
            use_directive: app.use_directive.unwrap_or(false),
            debug: app.debug == Some(true),
        }
    }
}

/// Returns the trimmed value when it is non-empty
pub fn valid_string(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Whether `value` is an absolute `http`/`https` URL with a hostname
pub fn is_valid_host(value: Option<&str>) -> bool {
    value.and_then(parse_host).is_some()
}

fn parse_host(value: &str) -> Option<Url> {
    let url = Url::parse(value.trim()).ok()?;
    let has_hostname = url.host_str().is_some_and(|h| !h.is_empty());
    (has_hostname && matches!(url.scheme(), "http" | "https")).then_some(url)
}

fn is_hosted_collector(url: &Url) -> bool {
    url.host_str().is_some_and(|h| h.contains(HOSTED_COLLECTOR))
}

/// Guarantee a leading `/`; a lone `/` means "use the default path"
pub fn normalize_endpoint(value: Option<&str>) -> Option<String> {
    let value = valid_string(value)?;
    if value == "/" {
        return None;
    }
    if value.starts_with('/') {
        Some(value.to_string())
    } else {
        Some(format!("/{}", value))
    }
}

fn normalize_domains(value: Option<&[String]>) -> Option<Vec<String>> {
    let domains: Vec<String> = value?
        .iter()
        .filter_map(|d| valid_string(Some(d.as_str())))
        .map(str::to_string)
        .collect();
    (!domains.is_empty()).then_some(domains)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime(host: Option<&str>, id: Option<&str>) -> RuntimeConfig {
        RuntimeConfig {
            umami_host: host.map(String::from),
            umami_id: id.map(String::from),
        }
    }

    fn app(host: &str, id: &str) -> UmamiOptions {
        UmamiOptions {
            host: Some(host.to_string()),
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.host.is_none());
        assert_eq!(settings.id, "");
        assert!(settings.domains.is_none());
        assert!(settings.ignore_dnt);
        assert!(!settings.ignore_local);
        assert!(settings.auto_track);
        assert!(settings.custom_endpoint.is_none());
        assert_eq!(settings.version, CollectorVersion::V1);
        assert!(!settings.use_directive);
        assert!(!settings.debug);
    }

    #[test]
    fn test_runtime_takes_precedence() {
        let rt = runtime(Some("https://runtime.example.com"), Some("rt-id"));
        let options = app("https://app.example.com", "app-id");
        let settings = Settings::from_sources(Some(&rt), Some(&options));

        assert_eq!(
            settings.host.unwrap().host_str(),
            Some("runtime.example.com")
        );
        assert_eq!(settings.id, "rt-id");
    }

    #[test]
    fn test_blank_runtime_falls_back_to_app() {
        let rt = runtime(Some("   "), Some(""));
        let options = app("https://app.example.com", " app-id ");
        let settings = Settings::from_sources(Some(&rt), Some(&options));

        assert_eq!(settings.host.unwrap().host_str(), Some("app.example.com"));
        assert_eq!(settings.id, "app-id");
    }

    #[test]
    fn test_invalid_host_becomes_none() {
        for host in ["not a url", "ftp://example.com", "example.com", "mailto:a@b.c"] {
            let settings = Settings::from_sources(None, Some(&app(host, "id")));
            assert!(settings.host.is_none(), "{host} should be rejected");
        }
    }

    #[test]
    fn test_is_valid_host() {
        assert!(is_valid_host(Some("https://example.com")));
        assert!(is_valid_host(Some("http://localhost:3000")));
        assert!(!is_valid_host(None));
        assert!(!is_valid_host(Some("")));
        assert!(!is_valid_host(Some("::nope::")));
        assert!(!is_valid_host(Some("ftp://example.com")));
        assert!(!is_valid_host(Some("file:///etc/hosts")));
    }

    #[test]
    fn test_hosted_collector_forces_v2() {
        let options = app("https://analytics.umami.is", "id");
        let settings = Settings::from_sources(None, Some(&options));
        assert_eq!(settings.version, CollectorVersion::V2);
    }

    #[test]
    fn test_configured_version() {
        let mut options = app("https://example.com", "id");
        options.version = Some(2);
        assert_eq!(
            Settings::from_sources(None, Some(&options)).version,
            CollectorVersion::V2
        );

        options.version = Some(7);
        assert_eq!(
            Settings::from_sources(None, Some(&options)).version,
            CollectorVersion::V1
        );
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize_endpoint(Some("track")), Some("/track".to_string()));
        assert_eq!(normalize_endpoint(Some(" /track ")), Some("/track".to_string()));
        assert_eq!(normalize_endpoint(Some("/")), None);
        assert_eq!(normalize_endpoint(Some("  ")), None);
        assert_eq!(normalize_endpoint(None), None);
    }

    #[test]
    fn test_domains_are_cleaned() {
        let mut options = UmamiOptions::default();
        options.domains = Some(vec![" a.com ".to_string(), "".to_string()]);
        assert_eq!(
            Settings::from_sources(None, Some(&options)).domains,
            Some(vec!["a.com".to_string()])
        );

        options.domains = Some(vec!["  ".to_string()]);
        assert!(Settings::from_sources(None, Some(&options)).domains.is_none());
    }

    #[test]
    fn test_debug_is_strict() {
        let mut options = UmamiOptions::default();
        assert!(!Settings::from_sources(None, Some(&options)).debug);
        options.debug = Some(true);
        assert!(Settings::from_sources(None, Some(&options)).debug);
    }
}
