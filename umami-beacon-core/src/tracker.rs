//! Tracker
//!
//! Settings and the endpoint are derived once from the config. Preflight
//! and the page snapshot are derived again on every call, so they are never
//! stale relative to the client context passed in.

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::collector::CollectorClient;
use crate::config::Config;
use crate::context::{ClientContext, PageState};
use crate::debug::DebugSink;
use crate::endpoint;
use crate::error::Result;
use crate::payload::{self, PageSnapshot, ServerPayload};
use crate::preflight::{self, Preflight};
use crate::settings::Settings;

/// Per-call overrides for [`Tracker::track_view`]
#[derive(Debug, Clone, Default)]
pub struct ViewOverrides {
    pub url: Option<String>,
    pub referrer: Option<String>,
}

/// Pageview and event tracking for one configured website
#[derive(Debug, Clone)]
pub struct Tracker {
    settings: Settings,
    client: CollectorClient,
}

impl Tracker {
    /// Build a tracker, choosing the debug sink from the config
    pub fn new(config: &Config) -> Result<Self> {
        let settings = Settings::from_sources(Some(&config.runtime), config.umami.as_ref());
        let sink = DebugSink::select(config.mode, settings.debug);
        Self::with_sink(settings, sink)
    }

    /// Build a tracker from already-normalized settings
    pub fn with_sink(settings: Settings, sink: DebugSink) -> Result<Self> {
        let endpoint = endpoint::resolve(&settings);
        tracing::debug!(
            endpoint = %endpoint,
            version = %settings.version,
            sink_enabled = sink.is_enabled(),
            "Tracker configured"
        );

        Ok(Self {
            client: CollectorClient::new(endpoint, sink)?,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }

    /// Evaluate the tracking gate for `client`
    pub fn preflight(&self, client: Option<&ClientContext>) -> Preflight {
        preflight::evaluate(&self.settings, self.endpoint(), client)
    }

    /// Capture the current page
    pub fn snapshot(&self, client: &ClientContext, page: &PageState) -> PageSnapshot {
        payload::snapshot(client, page)
    }

    /// Send a pageview if preflight allows it
    ///
    /// Non-empty overrides replace the captured url and referrer.
    pub fn track_view(
        &self,
        client: Option<&ClientContext>,
        page: &PageState,
        overrides: &ViewOverrides,
    ) -> Option<JoinHandle<()>> {
        let client = self.allowed_client(client, "view")?;

        let mut snap = payload::snapshot(client, page);
        if let Some(url) = non_blank(overrides.url.as_deref()) {
            snap.payload.url = url.to_string();
        }
        if let Some(referrer) = non_blank(overrides.referrer.as_deref()) {
            snap.payload.referrer = referrer.to_string();
        }

        let body = ServerPayload::pageview(self.settings.version, &self.settings.id, snap.payload);
        self.client.collect(body)
    }

    /// Send a named custom event if preflight allows it
    pub fn track_event(
        &self,
        client: Option<&ClientContext>,
        page: &PageState,
        name: &str,
        data: Option<Value>,
    ) -> Option<JoinHandle<()>> {
        let Some(name) = non_blank(Some(name)) else {
            tracing::warn!("Ignoring custom event without a name");
            return None;
        };
        let client = self.allowed_client(client, "event")?;

        let snap = payload::snapshot(client, page);
        let body = ServerPayload::event(
            self.settings.version,
            &self.settings.id,
            snap.payload,
            name.trim(),
            data,
        );
        self.client.collect(body)
    }

    /// Navigation hook; tracks a pageview when auto-tracking is on
    pub fn on_navigation(
        &self,
        client: Option<&ClientContext>,
        page: &PageState,
    ) -> Option<JoinHandle<()>> {
        if !self.settings.auto_track {
            return None;
        }
        self.track_view(client, page, &ViewOverrides::default())
    }

    fn allowed_client<'a>(
        &self,
        client: Option<&'a ClientContext>,
        what: &str,
    ) -> Option<&'a ClientContext> {
        match self.preflight(client) {
            Preflight::Allowed => client,
            Preflight::Blocked(reason) => {
                tracing::debug!(%reason, what, "Tracking skipped");
                None
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
