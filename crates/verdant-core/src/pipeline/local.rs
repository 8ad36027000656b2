//! Local tier: classifier, confidence gate and reference data

use crate::gate::{decide, GateDecision};
use crate::normalize::{from_local, split_label};
use crate::prediction::Classifier;
use crate::provider::{DiagnosisProvider, ImageInput, ProviderOutcome};
use crate::reference::{NoReferenceData, ReferenceDisease, ReferenceLookup};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// The first tier of every pipeline.
///
/// Runs the classifier and either resolves the request (gate passes) or
/// reports `Skipped` so the remote tiers get their turn.
pub struct LocalTier {
    classifier: Arc<dyn Classifier>,
    reference: Arc<dyn ReferenceLookup>,
}

impl LocalTier {
    /// Local tier without reference data
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            reference: Arc::new(NoReferenceData),
        }
    }

    /// Attach the curated reference data used to fill details
    #[must_use]
    pub fn with_reference(mut self, reference: Arc<dyn ReferenceLookup>) -> Self {
        self.reference = reference;
        self
    }

    /// Whether the classifier's model is loaded
    #[must_use]
    pub fn classifier_loaded(&self) -> bool {
        self.classifier.is_loaded()
    }

    async fn find_reference(&self, disease: &str) -> Option<ReferenceDisease> {
        // "Paddy" alone would match every record
        if disease.is_empty() {
            return None;
        }
        match self.reference.lookup(disease).await {
            Ok(found) => found,
            Err(e) => {
                warn!(disease = %disease, error = %e, "Reference lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl DiagnosisProvider for LocalTier {
    fn name(&self) -> &str {
        self.classifier.name()
    }

    async fn analyze(&self, image: &ImageInput) -> ProviderOutcome {
        let prediction = self.classifier.predict(image.bytes()).await;
        debug!(
            label = %prediction.label,
            raw_label = ?prediction.raw_label,
            confidence = prediction.confidence,
            "Local prediction"
        );

        if decide(&prediction) == GateDecision::Escalate {
            let reason = if prediction.is_error() {
                prediction.label.clone()
            } else {
                format!("low confidence ({:.3})", prediction.confidence)
            };
            return ProviderOutcome::Skipped(reason);
        }

        let (_, disease) = split_label(&prediction.label);
        let reference = self.find_reference(&disease).await;
        ProviderOutcome::Success(from_local(&prediction, reference))
    }
}
