//! Typed errors for the crawl-tail client.
//!
//! Start and tail failures are kept apart because they are handled
//! differently: a start failure ends the attempt and is shown to the user,
//! while a tail failure is rendered as one log line and retried on the next
//! tick.

use thiserror::Error;

/// Result alias for start requests.
pub type StartResult<T> = std::result::Result<T, StartError>;

/// Result alias for tail requests.
pub type TailResult<T> = std::result::Result<T, TailError>;

/// Errors from the start request. The job never began.
#[derive(Debug, Error)]
pub enum StartError {
    /// No start endpoint is configured; no request was sent.
    #[error("start endpoint is not configured")]
    NotConfigured,

    /// Transport failure (connection refused, DNS, aborted body...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response could not be interpreted (non-2xx without a reason,
    /// wrong content type, malformed JSON, missing `ok`).
    #[error("bad response: {0}")]
    BadResponse(String),

    /// The server explicitly refused to start the job.
    #[error("{0}")]
    Rejected(String),
}

/// Errors from a single tail request. Always transient.
#[derive(Debug, Error)]
pub enum TailError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}")]
    Status { status: u16 },

    /// Wrong content type, malformed JSON or a missing required field.
    #[error("bad response: {0}")]
    BadResponse(String),

    /// Payload carried `ok: false`.
    #[error("tail rejected: {0}")]
    Rejected(String),
}

/// Errors while assembling a [`JobConfig`](crate::JobConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL for {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("unknown cursor kind: {0}")]
    UnknownCursor(String),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}
