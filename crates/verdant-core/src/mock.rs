//! Test doubles for the pipeline seams
//!
//! Used by this crate's tests, the server's handler tests and the
//! workspace integration tests.

use crate::diagnosis::DiagnosisResult;
use crate::error::{Error, Result};
use crate::prediction::{Classifier, ClassifierPrediction};
use crate::provider::{DiagnosisProvider, ImageInput, ProviderError, ProviderOutcome};
use crate::reference::{ReferenceDisease, ReferenceLookup};
use async_trait::async_trait;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A provider that replays queued outcomes and counts calls
pub struct MockProvider {
    name: String,
    outcomes: Mutex<VecDeque<ProviderOutcome>>,
    otherwise: ProviderOutcome,
    calls: AtomicUsize,
    delay: Option<Duration>,
    panics: bool,
}

impl MockProvider {
    /// Create a mock with an empty queue.
    ///
    /// Once the queue is drained every call answers `Failure(Unavailable)`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcomes: Mutex::new(VecDeque::new()),
            otherwise: ProviderOutcome::Failure(ProviderError::Unavailable(
                "no queued outcome".to_string(),
            )),
            calls: AtomicUsize::new(0),
            delay: None,
            panics: false,
        }
    }

    /// A mock that always succeeds with `result`
    #[must_use]
    pub fn succeeding(name: impl Into<String>, result: DiagnosisResult) -> Self {
        Self::new(name).otherwise(ProviderOutcome::Success(result))
    }

    /// Answer used once the queue is drained
    #[must_use]
    pub fn otherwise(mut self, outcome: ProviderOutcome) -> Self {
        self.otherwise = outcome;
        self
    }

    /// A mock that always fails
    #[must_use]
    pub fn failing(name: impl Into<String>) -> Self {
        Self::new(name)
    }

    /// Sleep before answering
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Panic instead of answering
    #[must_use]
    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    /// Queue an outcome
    pub fn push(&self, outcome: ProviderOutcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }

    /// Number of `analyze` calls so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiagnosisProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(&self, _image: &ImageInput) -> ProviderOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.panics {
            panic!("mock provider {} panicked", self.name);
        }

        let queued = self
            .outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        queued.unwrap_or_else(|| self.otherwise.clone())
    }
}

/// A classifier that always returns the same prediction
pub struct MockClassifier {
    prediction: ClassifierPrediction,
    loaded: bool,
    calls: AtomicUsize,
}

impl MockClassifier {
    /// Classifier returning `label` with `confidence`, thresholded at `threshold`
    #[must_use]
    pub fn new(label: &str, confidence: f32, threshold: f32) -> Self {
        Self::with_prediction(ClassifierPrediction::from_top_class(
            label, confidence, threshold,
        ))
    }

    /// Classifier returning a fixed prediction
    #[must_use]
    pub fn with_prediction(prediction: ClassifierPrediction) -> Self {
        let loaded = !prediction.is_error();
        Self {
            prediction,
            loaded,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `predict` calls so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    fn name(&self) -> &str {
        "mock-classifier"
    }

    async fn predict(&self, _image: &[u8]) -> ClassifierPrediction {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prediction.clone()
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }
}

/// In-memory reference data with the store's substring semantics
#[derive(Default)]
pub struct MockReference {
    records: Vec<ReferenceDisease>,
    broken: bool,
}

impl MockReference {
    /// Reference data holding `records`
    #[must_use]
    pub fn new(records: Vec<ReferenceDisease>) -> Self {
        Self {
            records,
            broken: false,
        }
    }

    /// Reference data whose every lookup fails
    #[must_use]
    pub fn broken() -> Self {
        Self {
            records: Vec::new(),
            broken: true,
        }
    }
}

#[async_trait]
impl ReferenceLookup for MockReference {
    async fn lookup(&self, disease_name: &str) -> Result<Option<ReferenceDisease>> {
        if self.broken {
            return Err(Error::Reference("mock reference store is down".to_string()));
        }
        let needle = disease_name.to_lowercase();
        Ok(self
            .records
            .iter()
            .find(|record| record.name.to_lowercase().contains(&needle))
            .cloned())
    }
}
