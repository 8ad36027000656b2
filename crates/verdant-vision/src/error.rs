//! Error types for verdant-vision

use std::time::Duration;
use thiserror::Error;
use verdant_core::ProviderError;

/// Vision error type
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// API error (already sanitized)
    #[error("api error {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Sanitized message
        message: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Model artifacts missing or unusable
    #[error("model error: {0}")]
    Model(String),

    /// Image could not be decoded
    #[error("image error: {0}")]
    Image(String),
}

impl Error {
    /// Map a reqwest failure, keeping timeouts distinct
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            // without_url: request URLs may carry credentials
            Self::Network(err.without_url().to_string())
        }
    }
}

impl From<Error> for ProviderError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotConfigured(msg) | Error::Model(msg) => Self::Unavailable(msg),
            Error::Api { status, message } => Self::Status { status, message },
            Error::Network(msg) => Self::Transport(msg),
            Error::Timeout(duration) => Self::Timeout(duration),
            Error::InvalidResponse(msg) | Error::Image(msg) => Self::Parse(msg),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
