//! Verdant Core - Diagnosis pipeline
//!
//! This crate holds everything that decides *what* diagnosis a request gets,
//! independent of any transport:
//! - Diagnosis: canonical result record and treatment types
//! - Prediction: local classifier contract and its sentinel labels
//! - Gate: pass/escalate decision on a local prediction
//! - Normalize: mapping local labels and provider JSON into the canonical record
//! - Provider: the uniform `DiagnosisProvider` contract and typed outcomes
//! - Pipeline: ordered fallback chain with a guaranteed terminal result
//! - Translate: optional post-processing into another language
//! - Mock: test doubles for providers, classifiers and reference data

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod diagnosis;
pub mod error;
pub mod gate;
pub mod mime;
pub mod mock;
pub mod normalize;
pub mod pipeline;
pub mod prediction;
pub mod provider;
pub mod reference;
pub mod translate;

pub use diagnosis::{DiagnosisDetails, DiagnosisResult, Treatment, TreatmentKind, UNKNOWN};
pub use error::{Error, Result};
pub use gate::{decide, GateDecision};
pub use mime::detect_mime;
pub use pipeline::{
    AttemptStatus, DiagnosisPipeline, DiagnosisReport, LocalTier, ProviderAttempt, StaticFallback,
};
pub use prediction::{Classifier, ClassifierPrediction, DEFAULT_CONFIDENCE_THRESHOLD};
pub use provider::{DiagnosisProvider, ImageInput, ProviderError, ProviderOutcome};
pub use reference::{NoReferenceData, ReferenceDisease, ReferenceLookup};
pub use translate::{TextGenerator, Translator};
