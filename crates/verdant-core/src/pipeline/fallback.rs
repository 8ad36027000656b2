//! Terminal fallback

use crate::diagnosis::{DiagnosisDetails, DiagnosisResult};

/// Always-available result used once every tier has failed or declined
#[derive(Debug, Clone)]
pub struct StaticFallback {
    result: DiagnosisResult,
}

impl StaticFallback {
    /// Name reported as `resolved_by` when the fallback answers
    pub const NAME: &'static str = "static-fallback";

    /// Plant name of the fallback result
    pub const PLANT_NAME: &'static str = "Server Unavailable";

    /// Disease name of the fallback result
    pub const DISEASE_NAME: &'static str = "Analysis Unavailable";

    /// Fallback result with a custom description
    #[must_use]
    pub fn with_message(description: impl Into<String>) -> Self {
        let details = DiagnosisDetails {
            description: description.into(),
            severity: "Unknown".to_string(),
            prevention: "Retake the photo in daylight with a single leaf filling the frame."
                .to_string(),
            treatments: Vec::new(),
        };
        Self {
            result: DiagnosisResult::new(Self::PLANT_NAME, Self::DISEASE_NAME, 0.0)
                .with_details(details),
        }
    }

    /// The fallback result
    #[must_use]
    pub fn result(&self) -> DiagnosisResult {
        self.result.clone()
    }
}

impl Default for StaticFallback {
    fn default() -> Self {
        Self::with_message(
            "No diagnosis service could analyze this image right now. Please try again later.",
        )
    }
}
