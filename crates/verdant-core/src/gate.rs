//! Confidence gate
//!
//! The threshold is already applied by the classifier (below it the label is
//! the `Unknown` sentinel), so the gate only has to read the label.

use crate::prediction::ClassifierPrediction;

/// What to do with a local prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Use the local result
    Pass,
    /// Try the remote tiers
    Escalate,
}

impl GateDecision {
    /// Whether the local result should be used
    #[must_use]
    pub fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Decide whether a prediction can be served as-is
#[must_use]
pub fn decide(prediction: &ClassifierPrediction) -> GateDecision {
    if prediction.is_unknown() || prediction.is_error() {
        GateDecision::Escalate
    } else {
        GateDecision::Pass
    }
}
