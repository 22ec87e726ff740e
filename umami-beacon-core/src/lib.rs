//! # umami-beacon-core
//!
//! Pageview beacons for an Umami collector.
//!
//! This library provides:
//! - Settings normalization from a runtime and an app configuration source
//! - A preflight gate (SSR, id, host, localhost, domain allow-list, Do-Not-Track)
//! - Collector endpoint resolution for v1 (`/api/collect`) and v2 (`/api/send`)
//! - Page snapshots and the wire payloads built from them
//! - A fire-and-forget HTTP transport that never surfaces failures
//!
//! ## Flow
//!
//! ```text
//! Config ─► Settings ─┬─► preflight ─┐
//!                     └─► endpoint ──┴─► snapshot ─► collect
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use umami_beacon_core::{ClientContext, Config, PageState, Tracker, ViewOverrides};
//!
//! # async fn run(client: ClientContext) {
//! let config = Config::load().expect("failed to load config");
//! let tracker = Tracker::new(&config).expect("failed to build tracker");
//!
//! let page = PageState::default();
//! if let Some(task) = tracker.track_view(Some(&client), &page, &ViewOverrides::default()) {
//!     let _ = task.await;
//! }
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use collector::CollectorClient;
pub use config::{Config, Mode};
pub use context::{ClientContext, PageState};
pub use debug::DebugSink;
pub use error::{Error, Result};
pub use payload::{PageSnapshot, Payload, ServerPayload};
pub use preflight::{BlockReason, Preflight};
pub use settings::{CollectorVersion, Settings};
pub use tracker::{Tracker, ViewOverrides};

// Public modules
pub mod collector;
pub mod config;
pub mod context;
pub mod debug;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod payload;
pub mod preflight;
pub mod settings;
pub mod tracker;
