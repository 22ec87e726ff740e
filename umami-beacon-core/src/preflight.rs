//! Tracking gate
//!
//! Decides, before anything is built or sent, whether a beacon may leave the
//! client. Checks run in a fixed order and the first match wins: environment
//! and required settings first, live navigator state (Do-Not-Track) last.

use std::fmt;

use serde::Serialize;

use crate::context::ClientContext;
use crate::settings::{is_valid_host, valid_string, Settings};

/// Why a beacon was not sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockReason {
    /// No client context (server-side rendering)
    Ssr,
    /// Missing website id
    Id,
    /// Missing or invalid collector host
    Host,
    /// Running on `localhost` with `ignore_localhost` set
    Local,
    /// Hostname outside the configured allow-list
    Domain,
    /// The client sent a Do-Not-Track signal
    Dnt,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::Ssr => "ssr",
            BlockReason::Id => "id",
            BlockReason::Host => "host",
            BlockReason::Local => "local",
            BlockReason::Domain => "domain",
            BlockReason::Dnt => "dnt",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preflight {
    Allowed,
    Blocked(BlockReason),
}

impl Preflight {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Preflight::Allowed)
    }
}

impl fmt::Display for Preflight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preflight::Allowed => f.write_str("allowed"),
            Preflight::Blocked(reason) => write!(f, "blocked ({})", reason),
        }
    }
}

/// Evaluate the gate for one navigation
pub fn evaluate(settings: &Settings, endpoint: &str, client: Option<&ClientContext>) -> Preflight {
    let Some(client) = client else {
        return Preflight::Blocked(BlockReason::Ssr);
    };

    if valid_string(Some(settings.id.as_str())).is_none() {
        return Preflight::Blocked(BlockReason::Id);
    }

    if settings.host.is_none() || !is_valid_host(Some(endpoint)) {
        return Preflight::Blocked(BlockReason::Host);
    }

    let hostname = client.location.hostname.as_str();

    if settings.ignore_local && hostname == "localhost" {
        return Preflight::Blocked(BlockReason::Local);
    }

    if let Some(domains) = settings.domains.as_deref() {
        if !domains.is_empty() && !domains.iter().any(|d| d == hostname) {
            return Preflight::Blocked(BlockReason::Domain);
        }
    }

    if !settings.ignore_dnt && client.do_not_track() {
        return Preflight::Blocked(BlockReason::Dnt);
    }

    Preflight::Allowed
}
