//! Error types for umami-beacon-core

use thiserror::Error;

/// Main error type for the umami-beacon-core library
///
/// Only configuration loading and the raw collector send surface errors.
/// Tracking operations swallow them (see [`crate::collector`]).
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Network-level failure talking to the collector
    #[error("collector request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Collector answered with a non-success status
    #[error("collector responded with {0}")]
    Status(reqwest::StatusCode),

    /// `collect` was called outside a Tokio runtime
    #[error("no async runtime available: {0}")]
    Runtime(String),
}

/// Result type alias for umami-beacon-core
pub type Result<T> = std::result::Result<T, Error>;
