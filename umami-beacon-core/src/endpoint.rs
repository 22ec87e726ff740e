//! Collector endpoint resolution

use crate::settings::Settings;

/// Absolute collector URL for `settings`
///
/// `${protocol}//${authority}${path}`, with the custom endpoint replacing the
/// version default path. Without a host the result is the protocol-relative
/// `//` joined to the path (`//api/collect`); preflight reports such settings
/// as blocked on `host`.
pub fn resolve(settings: &Settings) -> String {
    let path = settings
        .custom_endpoint
        .as_deref()
        .unwrap_or_else(|| settings.version.default_path());

    let Some(url) = &settings.host else {
        return format!("//{}", path.trim_start_matches('/'));
    };

    let authority = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    format!("{}://{}{}", url.scheme(), authority, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UmamiOptions;

    fn settings(host: &str, endpoint: Option<&str>, version: Option<u64>) -> Settings {
        let options = UmamiOptions {
            host: Some(host.to_string()),
            id: Some("id".to_string()),
            custom_endpoint: endpoint.map(String::from),
            version,
            ..Default::default()
        };
        Settings::from_sources(None, Some(&options))
    }

    #[test]
    fn test_v1_default_path() {
        assert_eq!(
            resolve(&settings("https://example.com", None, Some(1))),
            "https://example.com/api/collect"
        );
    }

    #[test]
    fn test_v2_default_path() {
        assert_eq!(
            resolve(&settings("https://example.com", None, Some(2))),
            "https://example.com/api/send"
        );
    }

    #[test]
    fn test_hosted_collector_uses_send() {
        assert_eq!(
            resolve(&settings("https://analytics.umami.is", None, Some(1))),
            "https://analytics.umami.is/api/send"
        );
    }

    #[test]
    fn test_custom_endpoint_and_port() {
        assert_eq!(
            resolve(&settings("http://localhost:3000/ignored/path", Some("track"), None)),
            "http://localhost:3000/track"
        );
        assert_eq!(
            resolve(&settings("https://example.com", Some("/"), None)),
            "https://example.com/api/collect"
        );
    }

    #[test]
    fn test_missing_host_has_empty_authority() {
        assert_eq!(resolve(&Settings::default()), "//api/collect");
    }

    #[test]
    fn test_missing_host_keeps_custom_and_v2_paths() {
        let options = UmamiOptions {
            custom_endpoint: Some("track".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve(&Settings::from_sources(None, Some(&options))), "//track");

        let options = UmamiOptions {
            version: Some(2),
            ..Default::default()
        };
        assert_eq!(resolve(&Settings::from_sources(None, Some(&options))), "//api/send");
    }
}
