//! Debug sink
//!
//! The sink is chosen once when a tracker is built. Outside production it
//! always reports; in production only when `debug` is set. Everywhere else
//! the code just calls it.

use std::fmt;
use std::sync::Arc;

use crate::config::Mode;

type SinkFn = dyn Fn(&str, &dyn fmt::Debug) + Send + Sync;

/// Callable receiving `(tag, detail)` for swallowed failures
#[derive(Clone)]
pub struct DebugSink {
    inner: Arc<SinkFn>,
    enabled: bool,
}

impl DebugSink {
    /// Pick the sink for `mode` and the `debug` flag
    pub fn select(mode: Mode, debug: bool) -> Self {
        if !mode.is_production() || debug {
            Self::tracing()
        } else {
            Self::noop()
        }
    }

    /// Report through `tracing` at warn level
    pub fn tracing() -> Self {
        Self {
            inner: Arc::new(|tag: &str, detail: &dyn fmt::Debug| {
                tracing::warn!(tag, detail = ?detail, "umami");
            }),
            enabled: true,
        }
    }

    /// Drop everything
    pub fn noop() -> Self {
        Self {
            inner: Arc::new(|_: &str, _: &dyn fmt::Debug| {}),
            enabled: false,
        }
    }

    /// Use a custom callable
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str, &dyn fmt::Debug) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(f),
            enabled: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn emit(&self, tag: &str, detail: &dyn fmt::Debug) {
        (self.inner)(tag, detail)
    }
}

impl fmt::Debug for DebugSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugSink")
            .field("enabled", &self.enabled)
            .finish()
    }
}
