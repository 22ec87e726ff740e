//! Beacon payloads
//!
//! [`snapshot`] captures page state at send time. [`ServerPayload`] wraps it
//! in the envelope the collector expects, which differs between the two
//! collector versions:
//!
//! ```text
//! v1  {"type": "pageview" | "event", "payload": {..., "event_name", "event_data"}}
//! v2  {"type": "event",              "payload": {..., "name", "data"}}
//! ```

use reqwest::Url;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::context::{ClientContext, PageState};
use crate::settings::CollectorVersion;

/// Page state sent with every beacon
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Payload {
    /// `WIDTHxHEIGHT`
    pub screen: String,
    pub language: String,
    pub hostname: String,
    pub url: String,
    pub referrer: String,
    pub title: String,
}

/// A payload along with the url and referrer it was built from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSnapshot {
    pub payload: Payload,
    pub page_referrer: String,
    pub page_url: String,
}

/// Capture the current page
///
/// The router's full path wins over the raw location, and the reactive
/// title over `document.title`. When the document has no referrer, a `ref`
/// query parameter stands in for it.
pub fn snapshot(client: &ClientContext, page: &PageState) -> PageSnapshot {
    let current = Url::parse(&client.location.href).ok();

    let page_url = non_empty(page.route_full_path.as_deref())
        .map(str::to_string)
        .or_else(|| current.as_ref().map(path_query_fragment))
        .unwrap_or_default();

    let page_referrer = non_empty(Some(client.document.referrer.as_str()))
        .map(str::to_string)
        .or_else(|| current.as_ref().and_then(ref_param))
        .unwrap_or_default();

    let title = non_empty(page.title.as_deref())
        .unwrap_or(&client.document.title)
        .to_string();

    let payload = Payload {
        screen: format!("{}x{}", client.screen.width, client.screen.height),
        language: client.navigator.language.clone(),
        hostname: client.location.hostname.clone(),
        url: page_url.clone(),
        referrer: page_referrer.clone(),
        title,
    };

    PageSnapshot {
        payload,
        page_referrer,
        page_url,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn path_query_fragment(url: &Url) -> String {
    let mut out = url.path().to_string();
    if let Some(query) = url.query() {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

fn ref_param(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "ref")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Envelope type understood by the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Pageview,
    Event,
}

/// Wire record posted to the collector, serialized verbatim
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerPayload {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub payload: ServerPayloadBody,
}

/// Body of a [`ServerPayload`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerPayloadBody {
    /// Website id
    pub website: String,
    #[serde(flatten)]
    pub page: Payload,
    /// Caller-supplied metadata, merged into the body
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServerPayload {
    /// A pageview for `website`
    pub fn pageview(version: CollectorVersion, website: &str, page: Payload) -> Self {
        let kind = match version {
            CollectorVersion::V1 => EventKind::Pageview,
            CollectorVersion::V2 => EventKind::Event,
        };

        Self {
            kind,
            payload: ServerPayloadBody {
                website: website.to_string(),
                page,
                extra: Map::new(),
            },
        }
    }

    /// A named custom event for `website`
    pub fn event(
        version: CollectorVersion,
        website: &str,
        page: Payload,
        name: &str,
        data: Option<Value>,
    ) -> Self {
        let (name_key, data_key) = match version {
            CollectorVersion::V1 => ("event_name", "event_data"),
            CollectorVersion::V2 => ("name", "data"),
        };

        let mut extra = Map::new();
        extra.insert(name_key.to_string(), Value::String(name.to_string()));
        if let Some(data) = data {
            extra.insert(data_key.to_string(), data);
        }

        Self {
            kind: EventKind::Event,
            payload: ServerPayloadBody {
                website: website.to_string(),
                page,
                extra,
            },
        }
    }
}
