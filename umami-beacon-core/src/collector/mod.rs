//! Collector transport
//!
//! Beacons are best-effort. [`CollectorClient::collect`] hands the POST to a
//! background task and returns immediately; any failure goes to the
//! [`DebugSink`](crate::debug::DebugSink) under the `err-collect` tag and
//! nowhere else. Nothing is retried, queued or buffered.

mod client;

pub use client::{CollectorClient, ERR_COLLECT};
