//! Error types for the monitoring dashboard.

use thiserror::Error;

/// Result type alias for dashboard operations.
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors surfaced by the dashboard.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Transport failure talking to the API.
    #[error("request to {path} failed: {source}")]
    Http {
        /// API path.
        path: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with an error status.
    #[error("{path}: HTTP {status}: {message}")]
    Status {
        /// API path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Message returned by the API, if any.
        message: String,
    },

    /// The API answered with a body we could not decode.
    #[error("cannot decode {path}: {message}")]
    Decode {
        /// API path.
        path: String,
        /// Decoder message.
        message: String,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The browser could not be launched.
    #[error("cannot open {url}: {message}")]
    Browser {
        /// URL that was being opened.
        url: String,
        /// Launcher message.
        message: String,
    },
}
