//! Error types for the Wappu client

use thiserror::Error;

/// Errors that can occur when talking to the Wappu API
///
/// A task never returns one of these to its caller. The message is carried
/// in the payload of the matching `*_FAILURE` action instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// API answered with a non-success status
    #[error("API error (status {status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// Response body could not be decoded
    #[error("Response parsing failed: {0}")]
    Decode(String),

    /// No backend is available for the operation
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

/// Errors raised while loading [`crate::config::Config`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The API base URL is empty or not an http(s) URL
    #[error("Invalid API base URL: {0:?}")]
    InvalidBaseUrl(String),

    /// The map radius must be a positive, finite number of meters
    #[error("Invalid max distance: {0}")]
    InvalidMaxDistance(f64),

    /// The default city has no configured center
    #[error("Unknown default category: {0}")]
    UnknownCategory(String),

    /// A numeric setting could not be parsed
    #[error("Invalid value for {key}: {value:?}")]
    InvalidNumber {
        /// Environment variable name
        key: &'static str,
        /// Raw value found
        value: String,
    },
}
