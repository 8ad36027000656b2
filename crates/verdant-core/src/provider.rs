//! Diagnosis provider contract
//!
//! Every tier of the pipeline (local classifier, remote vision services)
//! implements [`DiagnosisProvider`]. Providers report failure as a value,
//! never by panicking or returning `Err`, so the pipeline can log the reason
//! and move on to the next tier.

use crate::diagnosis::DiagnosisResult;
use crate::mime::detect_mime;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// An uploaded image together with its detected MIME type
#[derive(Debug, Clone)]
pub struct ImageInput {
    bytes: Vec<u8>,
    mime_type: String,
    filename: Option<String>,
}

impl ImageInput {
    /// Wrap raw bytes, detecting the MIME type from content and filename
    #[must_use]
    pub fn new(bytes: Vec<u8>, filename: Option<String>) -> Self {
        let mime_type = detect_mime(&bytes, filename.as_deref()).to_string();
        Self {
            bytes,
            mime_type,
            filename,
        }
    }

    /// Override the detected MIME type
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Raw image bytes
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Detected MIME type
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Original filename, if the client sent one
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether there is no image data at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Why a provider produced no diagnosis
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Connection refused, DNS failure, body read error
    #[error("transport error: {0}")]
    Transport(String),

    /// No answer within the time budget
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Non-success HTTP status
    #[error("http {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Sanitized error message
        message: String,
    },

    /// The response was not in the expected shape
    #[error("unparseable response: {0}")]
    Parse(String),

    /// The provider is not usable (missing credentials, missing model)
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The provider panicked
    #[error("panicked: {0}")]
    Panicked(String),
}

impl ProviderError {
    /// Short machine-readable kind for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::Status { .. } => "status",
            Self::Parse(_) => "parse",
            Self::Unavailable(_) => "unavailable",
            Self::Panicked(_) => "panicked",
        }
    }
}

/// Result of asking one provider
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome {
    /// A usable diagnosis
    Success(DiagnosisResult),
    /// The provider tried and failed
    Failure(ProviderError),
    /// The provider declined (e.g. local confidence too low)
    Skipped(String),
}

impl ProviderOutcome {
    /// Whether this outcome carries a diagnosis
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<std::result::Result<DiagnosisResult, ProviderError>> for ProviderOutcome {
    fn from(result: std::result::Result<DiagnosisResult, ProviderError>) -> Self {
        match result {
            Ok(diagnosis) => Self::Success(diagnosis),
            Err(err) => Self::Failure(err),
        }
    }
}

/// A subsystem able to diagnose a plant image
#[async_trait]
pub trait DiagnosisProvider: Send + Sync {
    /// Provider name used in logs and attempt reports
    fn name(&self) -> &str;

    /// Analyze one image
    async fn analyze(&self, image: &ImageInput) -> ProviderOutcome;
}
