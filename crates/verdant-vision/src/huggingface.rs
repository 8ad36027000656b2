//! Hugging Face caption provider
//!
//! Secondary remote tier. An image-captioning model cannot diagnose, so a
//! successful caption becomes a best-effort result: the caption is the
//! description and the confidence is a fixed, configurable marker rather than
//! a calibrated score.

use crate::error::{Error, Result};
use crate::util::{mask_api_key, sanitize_api_error};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{instrument, warn};
use verdant_core::{
    DiagnosisDetails, DiagnosisProvider, DiagnosisResult, ImageInput, ProviderError,
    ProviderOutcome, Treatment, TreatmentKind, UNKNOWN,
};

/// Default inference API base URL
pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co/models";

/// Default captioning model
pub const DEFAULT_MODEL: &str = "Salesforce/blip-image-captioning-large";

/// Disease name reported for caption results
pub const CAPTION_DISEASE_NAME: &str = "Visual Analysis Complete";

/// Default confidence reported for caption results
pub const DEFAULT_CAPTION_CONFIDENCE: f32 = 0.85;

const CAPTION_PREVENTION: &str =
    "Keep foliage dry, remove affected leaves and monitor the plant over the next few days.";
const CAPTION_TREATMENT: &str =
    "Consult a local extension service or retake the photo for a detailed diagnosis.";

/// Caption provider configuration
#[derive(Clone)]
pub struct CaptionConfig {
    /// Bearer token
    pub api_token: String,
    /// Base URL; the model path is appended
    pub base_url: String,
    /// Model id
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
    /// Confidence reported on success
    pub confidence: f32,
}

// SECURITY: Custom Debug implementation to mask credentials
impl fmt::Debug for CaptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptionConfig")
            .field("api_token", &mask_api_key(&self.api_token))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("confidence", &self.confidence)
            .finish()
    }
}

impl CaptionConfig {
    /// Create a configuration with a token
    #[must_use]
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(15),
            confidence: DEFAULT_CAPTION_CONFIDENCE,
        }
    }

    /// Read `HF_API_TOKEN` (or `HUGGINGFACE_API_KEY`) and optional
    /// `HF_BASE_URL` / `HF_MODEL` overrides
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("HF_API_TOKEN")
            .or_else(|_| std::env::var("HUGGINGFACE_API_KEY"))
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                Error::NotConfigured("HF_API_TOKEN or HUGGINGFACE_API_KEY not set".to_string())
            })?;

        let mut config = Self::new(token.trim());
        if let Ok(base_url) = std::env::var("HF_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var("HF_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the reported confidence
    #[must_use]
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.model)
    }
}

#[derive(Debug, Deserialize)]
struct Caption {
    #[serde(default)]
    generated_text: String,
}

#[derive(Debug, Deserialize)]
struct HfError {
    error: String,
}

/// Wrap a caption into a best-effort diagnosis
#[must_use]
pub fn caption_to_result(caption: &str, confidence: f32) -> DiagnosisResult {
    DiagnosisResult::new(UNKNOWN, CAPTION_DISEASE_NAME, confidence).with_details(
        DiagnosisDetails {
            description: caption.trim().to_string(),
            severity: "Unknown".to_string(),
            prevention: CAPTION_PREVENTION.to_string(),
            treatments: vec![Treatment::new(TreatmentKind::General, CAPTION_TREATMENT)],
        },
    )
}

/// Caption-only provider backed by the Hugging Face inference API
pub struct CaptionProvider {
    client: Client,
    config: CaptionConfig,
}

impl CaptionProvider {
    /// Create a new provider
    pub fn new(config: CaptionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(CaptionConfig::from_env()?)
    }

    /// Caption one image
    #[instrument(skip(self, image), fields(model = %self.config.model, bytes = image.len()))]
    pub async fn caption(&self, image: &ImageInput) -> Result<String> {
        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_token)
            .header("content-type", image.mime_type())
            .body(image.bytes().to_vec())
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, self.config.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::from_reqwest(e, self.config.timeout))?;

        if !status.is_success() {
            warn!(status = %status, "Hugging Face API error response");
            let message = match serde_json::from_str::<HfError>(&body) {
                Ok(error) => sanitize_api_error(&error.error),
                Err(_) => sanitize_api_error(&format!("HTTP {status}")),
            };
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let captions: Vec<Caption> = serde_json::from_str(&body)
            .map_err(|e| Error::InvalidResponse(format!("unexpected caption body: {e}")))?;

        captions
            .into_iter()
            .map(|c| c.generated_text)
            .find(|text| !text.trim().is_empty())
            .ok_or_else(|| Error::InvalidResponse("no caption returned".to_string()))
    }
}

#[async_trait]
impl DiagnosisProvider for CaptionProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn analyze(&self, image: &ImageInput) -> ProviderOutcome {
        self.caption(image)
            .await
            .map(|caption| caption_to_result(&caption, self.config.confidence))
            .map_err(ProviderError::from)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn provider(base_url: &str) -> CaptionProvider {
        CaptionProvider::new(CaptionConfig::new("hf_test_token_123456").with_base_url(base_url))
            .unwrap()
    }

    #[test]
    fn test_caption_to_result() {
        let result = caption_to_result(" a leaf with brown spots ", DEFAULT_CAPTION_CONFIDENCE);
        assert_eq!(result.disease_name(), CAPTION_DISEASE_NAME);
        assert!((result.confidence() - 0.85).abs() < 1e-6);
        let details = result.details().unwrap();
        assert_eq!(details.description, "a leaf with brown spots");
        assert!(!details.prevention.is_empty());
        assert_eq!(details.treatments.len(), 1);
    }

    #[test]
    fn test_debug_masks_token() {
        let debug = format!("{:?}", CaptionConfig::new("hf_abcdefghijklmnop"));
        assert!(!debug.contains("abcdefghijkl"));
    }

    #[tokio::test]
    async fn test_caption_success() {
        let app = Router::new().route(
            "/Salesforce/blip-image-captioning-large",
            post(|headers: HeaderMap, body: Bytes| async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer hf_test_token_123456");
                if !authorized || body[..] != [1u8, 2, 3] {
                    return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad request"})));
                }
                (
                    StatusCode::OK,
                    Json(json!([{"generated_text": "a close up of a leaf with spots"}])),
                )
            }),
        );
        let base_url = spawn(app).await;

        let outcome = provider(&base_url)
            .analyze(&ImageInput::new(vec![1, 2, 3], None))
            .await;
        let ProviderOutcome::Success(result) = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(
            result.details().unwrap().description,
            "a close up of a leaf with spots"
        );
    }

    #[tokio::test]
    async fn test_model_loading_is_failure() {
        let app = Router::new().route(
            "/Salesforce/blip-image-captioning-large",
            post(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({"error": "Model is currently loading", "estimated_time": 20.0})),
                )
            }),
        );
        let base_url = spawn(app).await;

        let outcome = provider(&base_url)
            .analyze(&ImageInput::new(vec![1, 2, 3], None))
            .await;
        assert!(matches!(
            outcome,
            ProviderOutcome::Failure(ProviderError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_failure() {
        let app = Router::new().route(
            "/Salesforce/blip-image-captioning-large",
            post(|| async { Json(json!({"label": "leaf"})) }),
        );
        let base_url = spawn(app).await;

        let outcome = provider(&base_url)
            .analyze(&ImageInput::new(vec![1, 2, 3], None))
            .await;
        assert!(matches!(outcome, ProviderOutcome::Failure(ProviderError::Parse(_))));
    }

    #[tokio::test]
    async fn test_empty_caption_is_failure() {
        let app = Router::new().route(
            "/Salesforce/blip-image-captioning-large",
            post(|| async { Json(Value::Array(vec![json!({"generated_text": "  "})])) }),
        );
        let base_url = spawn(app).await;

        let outcome = provider(&base_url)
            .analyze(&ImageInput::new(vec![1, 2, 3], None))
            .await;
        assert!(matches!(outcome, ProviderOutcome::Failure(ProviderError::Parse(_))));
    }
}
