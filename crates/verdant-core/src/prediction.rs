//! Local classifier contract
//!
//! A [`Classifier`] turns raw image bytes into a [`ClassifierPrediction`]. It
//! never fails: undecodable input and missing model artifacts are reported
//! through sentinel labels so the gate can escalate.

use crate::diagnosis::{sanitize_confidence, UNKNOWN};
use async_trait::async_trait;
use serde::Serialize;

/// Confidence below which the classifier reports [`UNKNOWN`]
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.4;

/// Label for input that could not be decoded as an image
pub const ERROR_LABEL: &str = "Error";

/// Label reported while model or class-index artifacts are unavailable
pub const MODEL_NOT_LOADED_LABEL: &str = "Error: Model not loaded";

/// Label reported when inference itself failed
pub const PREDICTION_FAILED_LABEL: &str = "Error: Prediction failed";

/// Output of one classifier forward pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierPrediction {
    /// Reported label; [`UNKNOWN`] below threshold, `Error…` on failure
    pub label: String,
    /// Top-1 probability in `[0, 1]`
    pub confidence: f32,
    /// The model's real top-1 label, kept when `label` was overridden
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_label: Option<String>,
}

impl ClassifierPrediction {
    /// Build a prediction from the top class, applying the threshold policy.
    ///
    /// The comparison is strict: a confidence equal to `threshold` is kept.
    #[must_use]
    pub fn from_top_class(raw_label: impl Into<String>, confidence: f32, threshold: f32) -> Self {
        let raw_label = raw_label.into();
        let confidence = sanitize_confidence(confidence);

        if confidence < threshold {
            Self {
                label: UNKNOWN.to_string(),
                confidence,
                raw_label: Some(raw_label),
            }
        } else {
            Self {
                label: raw_label,
                confidence,
                raw_label: None,
            }
        }
    }

    /// Pick the arg-max class out of a probability vector.
    ///
    /// NaN scores never win. An empty vector or an index without a label is
    /// reported as a failed prediction.
    #[must_use]
    pub fn from_scores(scores: &[f32], labels: &[String], threshold: f32) -> Self {
        let best = scores
            .iter()
            .enumerate()
            .filter(|(_, score)| !score.is_nan())
            .max_by(|(_, a), (_, b)| a.total_cmp(b));

        match best.and_then(|(index, score)| labels.get(index).map(|label| (label, *score))) {
            Some((label, score)) => Self::from_top_class(label.clone(), score, threshold),
            None => Self::error(PREDICTION_FAILED_LABEL),
        }
    }

    /// A zero-confidence error prediction
    #[must_use]
    pub fn error(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            confidence: 0.0,
            raw_label: None,
        }
    }

    /// Whether the label is the below-threshold sentinel
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN
    }

    /// Whether the label reports an internal failure
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.label.starts_with(ERROR_LABEL)
    }
}

/// Local image classifier
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Name used in logs and attempt reports
    fn name(&self) -> &str;

    /// Classify raw image bytes
    async fn predict(&self, image: &[u8]) -> ClassifierPrediction;

    /// Whether model artifacts are currently loaded
    fn is_loaded(&self) -> bool {
        true
    }
}
