//! Error types for verdant-core

use thiserror::Error;

/// Core error type
///
/// None of these escape [`crate::DiagnosisPipeline`]; they surface inside
/// tiers and the translator, where they are logged and absorbed.
#[derive(Debug, Error)]
pub enum Error {
    /// Reference data could not be queried
    #[error("reference lookup failed: {0}")]
    Reference(String),

    /// Provider or translator text was not the expected JSON
    #[error("invalid payload: {0}")]
    Parse(String),

    /// Translation produced a result with a different shape
    #[error("translation failed: {0}")]
    Translation(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
