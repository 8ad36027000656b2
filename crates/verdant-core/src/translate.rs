//! Translation post-processor
//!
//! Rewrites the human-readable values of a [`DiagnosisResult`] into another
//! language with a [`TextGenerator`]. The generator's answer is only trusted
//! when it has the same shape as the input; otherwise the original result is
//! returned untouched.

use crate::diagnosis::{DiagnosisDetails, DiagnosisResult};
use crate::error::{Error, Result};
use crate::normalize::strip_code_fence;
use crate::provider::ProviderError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Language that needs no translation unless configured otherwise
pub const DEFAULT_LANGUAGE: &str = "en";

const MAX_LANGUAGE_LEN: usize = 35;

/// Free-form text generation (one prompt in, one answer out)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`
    async fn generate_text(&self, prompt: &str) -> std::result::Result<String, ProviderError>;
}

/// Translates diagnosis results, falling back to the input on any failure
#[derive(Clone)]
pub struct Translator {
    generator: Arc<dyn TextGenerator>,
    default_language: String,
}

impl Translator {
    /// Create a translator backed by `generator`
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Language for which translation is skipped
    #[must_use]
    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    /// Whether `target` differs from the default language
    #[must_use]
    pub fn needs_translation(&self, target: &str) -> bool {
        let target = target.trim();
        !target.is_empty() && !target.eq_ignore_ascii_case(&self.default_language)
    }

    /// Translate `result` into `target`.
    ///
    /// Returns a clone of `result` when no translation is needed or when
    /// anything goes wrong.
    pub async fn translate(&self, result: &DiagnosisResult, target: &str) -> DiagnosisResult {
        if !self.needs_translation(target) {
            return result.clone();
        }

        match self.try_translate(result, target.trim()).await {
            Ok(translated) => {
                debug!(language = %target, "Translated diagnosis");
                translated
            }
            Err(e) => {
                warn!(language = %target, error = %e, "Translation failed, keeping original");
                result.clone()
            }
        }
    }

    async fn try_translate(&self, result: &DiagnosisResult, target: &str) -> Result<DiagnosisResult> {
        validate_language(target)?;

        let json = serde_json::to_string(result)?;
        let answer = self
            .generator
            .generate_text(&build_prompt(&json, target))
            .await
            .map_err(|e| Error::Translation(e.to_string()))?;

        let translated: DiagnosisResult = serde_json::from_str(strip_code_fence(&answer))?;
        merge_translation(result, translated)
    }
}

/// Prompt asking for values-only translation of a JSON document
fn build_prompt(json: &str, target: &str) -> String {
    format!(
        "Translate the VALUES in the following JSON to {target}.\n\
         Do NOT translate the KEYS.\n\
         Keep the JSON structure exactly the same.\n\n\
         JSON:\n{json}\n\n\
         Return ONLY the raw JSON string, no markdown."
    )
}

/// Accept language codes and names ("hi", "pt-BR", "es-419", "Tamil"); reject anything
/// that could smuggle instructions into the prompt.
fn validate_language(target: &str) -> Result<()> {
    let valid = !target.is_empty()
        && target.len() <= MAX_LANGUAGE_LEN
        && target
            .chars()
            .all(|c| c.is_alphabetic() || c.is_ascii_digit() || matches!(c, '-' | '_' | ' '));
    if valid {
        Ok(())
    } else {
        Err(Error::Translation(format!("unsupported language tag: {target:?}")))
    }
}

/// Keep the translated text, restore everything that must not change.
fn merge_translation(
    original: &DiagnosisResult,
    translated: DiagnosisResult,
) -> Result<DiagnosisResult> {
    let details = match (original.details(), translated.details()) {
        (None, None) => None,
        (Some(before), Some(after)) => {
            if before.treatments.len() != after.treatments.len() {
                return Err(Error::Translation(format!(
                    "treatment count changed from {} to {}",
                    before.treatments.len(),
                    after.treatments.len()
                )));
            }
            let treatments = before
                .treatments
                .iter()
                .zip(after.treatments.iter())
                .map(|(b, a)| {
                    let mut treatment = a.clone();
                    treatment.kind = b.kind;
                    treatment
                })
                .collect();
            Some(DiagnosisDetails {
                description: after.description.clone(),
                severity: after.severity.clone(),
                prevention: after.prevention.clone(),
                treatments,
            })
        }
        _ => return Err(Error::Translation("details presence changed".to_string())),
    };

    Ok(DiagnosisResult::new(
        translated.plant_name(),
        translated.disease_name(),
        original.confidence(),
    )
    .with_optional_details(details))
}
