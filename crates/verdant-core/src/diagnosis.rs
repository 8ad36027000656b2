//! Canonical diagnosis record
//!
//! Every tier of the pipeline ends in a [`DiagnosisResult`]. Fields are private
//! so the confidence invariant (finite, within `[0, 1]`) holds for every value
//! that exists, including ones deserialized from provider or translator output.

use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder for names a tier could not determine
pub const UNKNOWN: &str = "Unknown";

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// Clamp a confidence into `[0, 1]`, mapping NaN and infinities to `0.0`
#[must_use]
pub fn sanitize_confidence(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn deserialize_confidence<'de, D>(deserializer: D) -> std::result::Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f32>::deserialize(deserializer)?;
    Ok(value.map(sanitize_confidence).unwrap_or(0.0))
}

/// Canonical diagnosis returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    #[serde(default = "unknown")]
    plant_name: String,
    #[serde(default = "unknown")]
    disease_name: String,
    #[serde(default, deserialize_with = "deserialize_confidence")]
    confidence: f32,
    #[serde(default)]
    details: Option<DiagnosisDetails>,
}

impl DiagnosisResult {
    /// Create a result without details
    ///
    /// Empty names are replaced by [`UNKNOWN`]; confidence is sanitized.
    #[must_use]
    pub fn new(
        plant_name: impl Into<String>,
        disease_name: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            plant_name: non_empty_or_unknown(plant_name.into()),
            disease_name: non_empty_or_unknown(disease_name.into()),
            confidence: sanitize_confidence(confidence),
            details: None,
        }
    }

    /// Attach details
    #[must_use]
    pub fn with_details(mut self, details: DiagnosisDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach optional details
    #[must_use]
    pub fn with_optional_details(mut self, details: Option<DiagnosisDetails>) -> Self {
        self.details = details;
        self
    }

    /// Plant name (e.g. "Tomato")
    #[must_use]
    pub fn plant_name(&self) -> &str {
        &self.plant_name
    }

    /// Disease name (e.g. "Early blight" or "Healthy")
    #[must_use]
    pub fn disease_name(&self) -> &str {
        &self.disease_name
    }

    /// Confidence in `[0, 1]`
    #[must_use]
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Curated or provider-supplied details, if any
    #[must_use]
    pub fn details(&self) -> Option<&DiagnosisDetails> {
        self.details.as_ref()
    }
}

fn non_empty_or_unknown(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        unknown()
    } else {
        trimmed.to_string()
    }
}

/// Human-readable details about a diagnosed condition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisDetails {
    /// What the condition looks like / what the provider observed
    #[serde(default)]
    pub description: String,
    /// Severity label ("Low", "Moderate", "High", ...)
    #[serde(default)]
    pub severity: String,
    /// Prevention advice
    #[serde(default)]
    pub prevention: String,
    /// Ordered treatment options
    #[serde(default)]
    pub treatments: Vec<Treatment>,
}

/// A single treatment option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    /// Treatment category
    #[serde(rename = "type", default)]
    pub kind: TreatmentKind,
    /// What to do
    #[serde(default)]
    pub description: String,
    /// Rough cost, free text (e.g. "$5 - $10")
    #[serde(default)]
    pub cost_approx: Option<String>,
}

impl Treatment {
    /// Create a treatment
    #[must_use]
    pub fn new(kind: TreatmentKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            cost_approx: None,
        }
    }

    /// Set the approximate cost
    #[must_use]
    pub fn with_cost(mut self, cost: impl Into<String>) -> Self {
        self.cost_approx = Some(cost.into());
        self
    }
}

/// Treatment category
///
/// Parsing is lenient: any unrecognised text becomes [`TreatmentKind::General`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TreatmentKind {
    /// Organic / biological control
    Organic,
    /// Chemical control
    Chemical,
    /// Anything else, including provider free text
    #[default]
    General,
}

impl TreatmentKind {
    /// Canonical display name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organic => "Organic",
            Self::Chemical => "Chemical",
            Self::General => "General",
        }
    }

    /// Lenient parse from free text
    #[must_use]
    pub fn parse_lossy(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "organic" | "biological" => Self::Organic,
            "chemical" => Self::Chemical,
            _ => Self::General,
        }
    }
}

impl From<String> for TreatmentKind {
    fn from(value: String) -> Self {
        Self::parse_lossy(&value)
    }
}

impl From<TreatmentKind> for String {
    fn from(kind: TreatmentKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for TreatmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
