//! Multi-tier fallback pipeline
//!
//! One image goes through the tiers in the order they were added. The first
//! `Success` resolves the request; later tiers are never called. When every
//! tier fails or declines, [`StaticFallback`] answers, so `diagnose` always
//! returns a result.
//!
//! Each tier call is bounded by a timeout and isolated from panics.

mod fallback;
mod local;

#[cfg(test)]
mod tests;

pub use fallback::StaticFallback;
pub use local::LocalTier;

use crate::diagnosis::DiagnosisResult;
use crate::provider::{DiagnosisProvider, ImageInput, ProviderError, ProviderOutcome};
use crate::translate::Translator;
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Default outer timeout for a single tier
pub const DEFAULT_TIER_TIMEOUT: Duration = Duration::from_secs(20);

/// How one attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// The tier produced the result
    Success,
    /// The tier tried and failed
    Failure,
    /// The tier declined
    Skipped,
}

/// Record of one tier call
#[derive(Debug, Clone, Serialize)]
pub struct ProviderAttempt {
    /// Tier name
    pub provider: String,
    /// Outcome kind
    pub status: AttemptStatus,
    /// Failure or skip reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Wall time spent in the tier
    pub elapsed_ms: u64,
}

/// Final result plus the trail of attempts that led to it
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisReport {
    /// The diagnosis returned to the caller
    pub result: DiagnosisResult,
    /// Name of the tier that produced `result`
    pub resolved_by: String,
    /// Every tier call, in order
    pub attempts: Vec<ProviderAttempt>,
}

impl DiagnosisReport {
    /// Whether the static fallback had to answer
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.resolved_by == StaticFallback::NAME
    }
}

/// Ordered chain of diagnosis tiers with a guaranteed terminal result
pub struct DiagnosisPipeline {
    tiers: Vec<Arc<dyn DiagnosisProvider>>,
    fallback: StaticFallback,
    tier_timeout: Duration,
    translator: Option<Translator>,
}

impl Default for DiagnosisPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosisPipeline {
    /// Empty pipeline: every request resolves to the static fallback
    #[must_use]
    pub fn new() -> Self {
        Self {
            tiers: Vec::new(),
            fallback: StaticFallback::default(),
            tier_timeout: DEFAULT_TIER_TIMEOUT,
            translator: None,
        }
    }

    /// Append a tier; tiers run in insertion order
    #[must_use]
    pub fn with_tier(mut self, tier: Arc<dyn DiagnosisProvider>) -> Self {
        self.tiers.push(tier);
        self
    }

    /// Replace the terminal fallback
    #[must_use]
    pub fn with_fallback(mut self, fallback: StaticFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Outer timeout applied to each tier call
    #[must_use]
    pub fn with_tier_timeout(mut self, timeout: Duration) -> Self {
        self.tier_timeout = timeout;
        self
    }

    /// Enable translation in [`Self::diagnose_in`]
    #[must_use]
    pub fn with_translator(mut self, translator: Translator) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Tier names in execution order
    #[must_use]
    pub fn tier_names(&self) -> Vec<String> {
        self.tiers.iter().map(|t| t.name().to_string()).collect()
    }

    /// Diagnose an image
    pub async fn diagnose(&self, image: &ImageInput) -> DiagnosisResult {
        self.diagnose_report(image).await.result
    }

    /// Diagnose an image and translate the result into `language`
    pub async fn diagnose_in(&self, image: &ImageInput, language: &str) -> DiagnosisResult {
        self.diagnose_report_in(image, language).await.result
    }

    /// Diagnose an image, translating the result, and keep the attempt trail
    pub async fn diagnose_report_in(&self, image: &ImageInput, language: &str) -> DiagnosisReport {
        let mut report = self.diagnose_report(image).await;

        // The fallback text is a service message, not a diagnosis
        if report.is_terminal() {
            return report;
        }
        if let Some(translator) = &self.translator {
            report.result = translator.translate(&report.result, language).await;
        }
        report
    }

    /// Diagnose an image and keep the attempt trail
    pub async fn diagnose_report(&self, image: &ImageInput) -> DiagnosisReport {
        let mut attempts = Vec::with_capacity(self.tiers.len());

        for tier in &self.tiers {
            let name = tier.name().to_string();
            let started = Instant::now();
            let outcome = self.run_tier(tier.as_ref(), image).await;
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            match outcome {
                ProviderOutcome::Success(result) => {
                    info!(
                        provider = %name,
                        elapsed_ms,
                        plant = %result.plant_name(),
                        disease = %result.disease_name(),
                        confidence = result.confidence(),
                        "Diagnosis resolved"
                    );
                    attempts.push(ProviderAttempt {
                        provider: name.clone(),
                        status: AttemptStatus::Success,
                        detail: None,
                        elapsed_ms,
                    });
                    return DiagnosisReport {
                        result,
                        resolved_by: name,
                        attempts,
                    };
                }
                ProviderOutcome::Failure(e) => {
                    warn!(provider = %name, elapsed_ms, kind = e.kind(), error = %e, "Tier failed");
                    attempts.push(ProviderAttempt {
                        provider: name,
                        status: AttemptStatus::Failure,
                        detail: Some(e.to_string()),
                        elapsed_ms,
                    });
                }
                ProviderOutcome::Skipped(reason) => {
                    info!(provider = %name, elapsed_ms, reason = %reason, "Tier skipped, escalating");
                    attempts.push(ProviderAttempt {
                        provider: name,
                        status: AttemptStatus::Skipped,
                        detail: Some(reason),
                        elapsed_ms,
                    });
                }
            }
        }

        warn!(tiers = self.tiers.len(), "All tiers exhausted, using static fallback");
        DiagnosisReport {
            result: self.fallback.result(),
            resolved_by: StaticFallback::NAME.to_string(),
            attempts,
        }
    }

    async fn run_tier(&self, tier: &dyn DiagnosisProvider, image: &ImageInput) -> ProviderOutcome {
        let call = AssertUnwindSafe(tier.analyze(image)).catch_unwind();
        match tokio::time::timeout(self.tier_timeout, call).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(panic)) => ProviderOutcome::Failure(ProviderError::Panicked(panic_message(
                panic.as_ref(),
            ))),
            Err(_) => ProviderOutcome::Failure(ProviderError::Timeout(self.tier_timeout)),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
