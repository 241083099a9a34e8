//! Unified error types for the price watcher.

use thiserror::Error;

use crate::exchange::Exchange;

/// Unified error type for the price watcher.
#[derive(Error, Debug)]
pub enum WatchError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration failed validation. Fatal before the loop starts.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Price source error.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-fetch price source errors.
///
/// Every variant is recovered locally by the poll loop: the exchange is
/// skipped for the cycle and its history simply does not advance.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The endpoint answered but carried no usable price.
    #[error("{exchange}: no price in response")]
    NoPrice {
        /// Exchange that returned the empty response.
        exchange: Exchange,
    },

    /// The fetch did not complete within the per-fetch timeout.
    #[error("{exchange}: fetch timed out after {timeout_ms}ms")]
    Timeout {
        /// Exchange that timed out.
        exchange: Exchange,
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// Non-success HTTP status.
    #[error("{exchange}: http status {status}")]
    BadStatus {
        /// Exchange that returned the status.
        exchange: Exchange,
        /// The status code.
        status: reqwest::StatusCode,
    },

    /// Response body could not be parsed into a price.
    #[error("{exchange}: failed to parse response: {reason}")]
    Parse {
        /// Exchange whose response failed to parse.
        exchange: Exchange,
        /// Reason for failure.
        reason: String,
    },

    /// Transport-level request failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, WatchError>;
