//! Gemini provider implementation

use super::config::GeminiConfig;
use super::types::{
    GeminiContent, GeminiError, GeminiPart, GeminiRequest, GeminiResponse, GenerationConfig,
    InlineData,
};
use crate::error::{Error, Result};
use crate::util::sanitize_api_error;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use tracing::{debug, instrument, warn};
use verdant_core::normalize::from_provider_json;
use verdant_core::{
    DiagnosisProvider, DiagnosisResult, ImageInput, ProviderError, ProviderOutcome, TextGenerator,
};

/// Instruction sent with every image
pub(crate) const DIAGNOSIS_PROMPT: &str = "Analyze this plant image. Identify the plant name and any disease it might have. \
If it's healthy, set disease_name to \"Healthy\". \
Respond strictly with a JSON object of this shape: \
{\"plant_name\": \"Name of plant\", \"disease_name\": \"Name of disease or 'Healthy'\", \
\"confidence\": 0.95, \"details\": {\"description\": \"Brief description of the condition\", \
\"treatment\": \"Recommended treatment (organic and chemical)\", \"prevention\": \"Prevention tips\"}}. \
Do not wrap the JSON in markdown.";

/// JSON schema matching [`DIAGNOSIS_PROMPT`]
pub(crate) fn diagnosis_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "plant_name": { "type": "STRING" },
            "disease_name": { "type": "STRING" },
            "confidence": { "type": "NUMBER" },
            "details": {
                "type": "OBJECT",
                "properties": {
                    "description": { "type": "STRING" },
                    "treatment": { "type": "STRING" },
                    "prevention": { "type": "STRING" }
                }
            }
        },
        "required": ["plant_name", "disease_name", "confidence"]
    })
}

/// Build the `generateContent` body for one image
pub(crate) fn build_diagnosis_request(image: &ImageInput, temperature: f32) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts: vec![
                GeminiPart::Text {
                    text: DIAGNOSIS_PROMPT.to_string(),
                },
                GeminiPart::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type().to_string(),
                        data: BASE64.encode(image.bytes()),
                    },
                },
            ],
        }],
        generation_config: Some(GenerationConfig {
            temperature: Some(temperature),
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(diagnosis_schema()),
        }),
    }
}

/// Build a plain text-in, text-out body
pub(crate) fn build_text_request(prompt: &str) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart::Text {
                text: prompt.to_string(),
            }],
        }],
        generation_config: None,
    }
}

/// Google Gemini provider
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
    name: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            name: format!("gemini:{}", config.model),
            config,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Provider configuration
    #[must_use]
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Diagnose one image
    #[instrument(skip(self, image), fields(model = %self.config.model, mime = %image.mime_type()))]
    pub async fn diagnose(&self, image: &ImageInput) -> Result<DiagnosisResult> {
        let text = self
            .generate(&build_diagnosis_request(image, self.config.temperature))
            .await?;
        from_provider_json(&text).map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    /// Answer a free-form gardening question
    pub async fn ask(&self, question: &str) -> Result<String> {
        self.generate(&build_text_request(question)).await
    }

    async fn generate(&self, request: &GeminiRequest) -> Result<String> {
        let response = self
            .client
            .post(self.config.generate_url())
            .header("x-goog-api-key", &self.config.api_key)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, self.config.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::from_reqwest(e, self.config.timeout))?;

        if !status.is_success() {
            warn!(status = %status, "Gemini API error response");
            // SECURITY: never pass the raw body on unsanitized
            let message = match serde_json::from_str::<GeminiError>(&body) {
                Ok(error) => sanitize_api_error(&format!(
                    "{}: {}",
                    error.error.status, error.error.message
                )),
                Err(_) => sanitize_api_error(&format!("HTTP {status}")),
            };
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| Error::InvalidResponse(format!("unexpected response body: {e}")))?;

        match parsed.text() {
            Some(text) => {
                debug!(chars = text.len(), "Gemini response received");
                Ok(text)
            }
            None => {
                let reason = parsed
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.clone())
                    .unwrap_or_else(|| "no candidates".to_string());
                Err(Error::InvalidResponse(format!("empty response ({reason})")))
            }
        }
    }
}

#[async_trait]
impl DiagnosisProvider for GeminiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(&self, image: &ImageInput) -> ProviderOutcome {
        self.diagnose(image).await.map_err(ProviderError::from).into()
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate_text(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
        self.generate(&build_text_request(prompt))
            .await
            .map_err(ProviderError::from)
    }
}
