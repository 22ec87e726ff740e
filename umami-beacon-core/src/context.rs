//! Client-side context consumed by preflight and payload building
//!
//! These are snapshots of what a browser window exposes at the time of a
//! navigation. The embedding host fills them in; an absent [`ClientContext`]
//! means the code is running during server-side rendering.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Snapshot of the browser window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientContext {
    pub location: Location,
    pub screen: Screen,
    pub navigator: Navigator,
    pub document: Document,
    /// `window.doNotTrack`
    #[serde(default)]
    pub do_not_track: Option<Value>,
}

/// `window.location`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub hostname: String,
    pub href: String,
}

impl Location {
    /// Build a location from a full URL, deriving the hostname
    pub fn from_href(href: &str) -> Self {
        let hostname = reqwest::Url::parse(href)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_default();

        Self {
            hostname,
            href: href.to_string(),
        }
    }
}

/// `window.screen`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    pub width: u32,
    pub height: u32,
}

/// `window.navigator`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Navigator {
    pub language: String,
    /// `navigator.doNotTrack`
    #[serde(default)]
    pub do_not_track: Option<Value>,
    /// `navigator.msDoNotTrack`
    #[serde(default)]
    pub ms_do_not_track: Option<Value>,
}

/// `window.document`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub referrer: String,
    pub title: String,
}

/// State owned by the host framework's router and head manager
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageState {
    /// Reactive page title, preferred over `document.title`
    pub title: Option<String>,
    /// Full path of the current route (path, query and fragment)
    pub route_full_path: Option<String>,
}

impl ClientContext {
    /// Whether any Do-Not-Track signal asks to opt out
    pub fn do_not_track(&self) -> bool {
        [
            &self.navigator.do_not_track,
            &self.do_not_track,
            &self.navigator.ms_do_not_track,
        ]
        .into_iter()
        .flatten()
        .any(is_opt_out)
    }
}

/// `1`, `"1"` and `"yes"` mean opted out
fn is_opt_out(signal: &Value) -> bool {
    match signal {
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => s == "1" || s == "yes",
        _ => false,
    }
}
