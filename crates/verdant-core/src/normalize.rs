//! Result normalizer
//!
//! Maps the two raw shapes the pipeline sees into [`DiagnosisResult`]:
//! - a local classifier label such as `Tomato__Early_blight`
//! - the JSON object a remote vision model returns
//!
//! Missing provider keys fall back to defaults. Only text that is not a JSON
//! object at all is an error.

use crate::diagnosis::{DiagnosisDetails, DiagnosisResult, Treatment, TreatmentKind};
use crate::error::Result;
use crate::prediction::ClassifierPrediction;
use crate::reference::ReferenceDisease;
use serde::Deserialize;
use serde_json::Value;

/// Severity assigned to remote results, which carry none
pub const DEFAULT_REMOTE_SEVERITY: &str = "Moderate";

/// Cost note attached to the single remote treatment
pub const DEFAULT_REMOTE_COST: &str = "Varies";

/// Split a class label into `(plant, disease)`.
///
/// The plant is everything before the first `_`; the disease is the rest with
/// underscore runs turned into single spaces.
///
/// ```
/// use verdant_core::normalize::split_label;
/// assert_eq!(
///     split_label("Tomato__Early_blight"),
///     ("Tomato".to_string(), "Early blight".to_string())
/// );
/// assert_eq!(split_label("Paddy"), ("Paddy".to_string(), String::new()));
/// ```
#[must_use]
pub fn split_label(label: &str) -> (String, String) {
    let label = label.trim();
    match label.split_once('_') {
        Some((plant, rest)) => {
            let disease = rest
                .split('_')
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            (plant.trim().to_string(), disease)
        }
        None => (label.to_string(), String::new()),
    }
}

/// Build a result from a confident local prediction and optional curated data.
///
/// Without a reference record the result has no details rather than an
/// empty placeholder.
#[must_use]
pub fn from_local(
    prediction: &ClassifierPrediction,
    reference: Option<ReferenceDisease>,
) -> DiagnosisResult {
    let (plant, disease) = split_label(&prediction.label);

    let details = reference.map(|record| DiagnosisDetails {
        description: record.symptoms,
        severity: record.severity,
        prevention: record.prevention,
        treatments: record.treatments,
    });

    DiagnosisResult::new(plant, disease, prediction.confidence).with_optional_details(details)
}

/// Remote provider JSON, every key optional
#[derive(Debug, Default, Deserialize)]
pub struct RawDiagnosis {
    /// Plant name
    #[serde(default)]
    pub plant_name: Option<String>,
    /// Disease name
    #[serde(default)]
    pub disease_name: Option<String>,
    /// Confidence as a number or numeric string
    #[serde(default)]
    pub confidence: Option<Value>,
    /// Details block
    #[serde(default)]
    pub details: Option<RawDetails>,
}

/// Remote provider details block
#[derive(Debug, Default, Deserialize)]
pub struct RawDetails {
    /// Condition description
    #[serde(default)]
    pub description: Option<Value>,
    /// Prevention advice
    #[serde(default)]
    pub prevention: Option<Value>,
    /// Treatment text, or an object/list of texts
    #[serde(default)]
    pub treatment: Option<Value>,
}

/// Parse provider text (markdown fences allowed) into a result
pub fn from_provider_json(text: &str) -> Result<DiagnosisResult> {
    let raw: RawDiagnosis = serde_json::from_str(strip_code_fence(text))?;
    Ok(from_raw(raw))
}

/// Map already-parsed provider JSON into a result
#[must_use]
pub fn from_raw(raw: RawDiagnosis) -> DiagnosisResult {
    let confidence = raw.confidence.as_ref().and_then(value_to_f32).unwrap_or(0.0);

    let details = raw.details.map(|details| DiagnosisDetails {
        description: details.description.map(value_to_text).unwrap_or_default(),
        severity: DEFAULT_REMOTE_SEVERITY.to_string(),
        prevention: details.prevention.map(value_to_text).unwrap_or_default(),
        treatments: vec![Treatment::new(
            TreatmentKind::General,
            details.treatment.map(value_to_text).unwrap_or_default(),
        )
        .with_cost(DEFAULT_REMOTE_COST)],
    });

    DiagnosisResult::new(
        raw.plant_name.unwrap_or_default(),
        raw.disease_name.unwrap_or_default(),
        confidence,
    )
    .with_optional_details(details)
}

/// Remove a surrounding markdown code fence (```` ```json ... ``` ````)
#[must_use]
pub fn strip_code_fence(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // language tag, if any
        text = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Read a confidence as a 0-1 fraction. `"85%"` and bare 0-100 scores are rescaled.
fn value_to_f32(value: &Value) -> Option<f32> {
    let (score, percent) = match value {
        Value::Number(n) => (n.as_f64()?, false),
        Value::String(s) => match s.trim().strip_suffix('%') {
            Some(digits) => (digits.trim().parse::<f64>().ok()?, true),
            None => (s.trim().parse::<f64>().ok()?, false),
        },
        _ => return None,
    };
    let fraction = if percent || (score > 1.0 && score <= 100.0) {
        score / 100.0
    } else {
        score
    };
    Some(fraction as f32)
}

/// Flatten a JSON value into display text.
///
/// Strings pass through; arrays and objects (e.g. `{"organic": ..., "chemical": ...}`)
/// are joined line by line.
fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, v)| (key, value_to_text(v)))
            .filter(|(_, s)| !s.is_empty())
            .map(|(key, s)| format!("{key}: {s}"))
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::UNKNOWN;

    #[test]
    fn test_split_label_variants() {
        assert_eq!(
            split_label("Potato___Late_blight"),
            ("Potato".into(), "Late blight".into())
        );
        assert_eq!(
            split_label("Banana__Ripeness__Overripe"),
            ("Banana".into(), "Ripeness Overripe".into())
        );
        assert_eq!(split_label("Tomato_healthy"), ("Tomato".into(), "healthy".into()));
    }

    #[test]
    fn test_from_local_without_reference() {
        let prediction = ClassifierPrediction::from_top_class("Tomato__Leaf_Mold", 0.81, 0.4);
        let result = from_local(&prediction, None);
        assert_eq!(result.plant_name(), "Tomato");
        assert_eq!(result.disease_name(), "Leaf Mold");
        assert!((result.confidence() - 0.81).abs() < 1e-6);
        assert!(result.details().is_none());
    }

    #[test]
    fn test_from_local_with_reference() {
        let prediction = ClassifierPrediction::from_top_class("Tomato__Early_blight", 0.9, 0.4);
        let reference = ReferenceDisease {
            name: "Early Blight".into(),
            plant: Some("Tomato".into()),
            severity: "Moderate".into(),
            symptoms: "Dark spots on leaves, yellowing.".into(),
            prevention: "Crop rotation, proper spacing.".into(),
            treatments: vec![
                Treatment::new(TreatmentKind::Organic, "Spray Neem oil every 7 days.")
                    .with_cost("$5 - $10"),
            ],
        };
        let result = from_local(&prediction, Some(reference));
        let details = result.details().unwrap();
        assert_eq!(details.description, "Dark spots on leaves, yellowing.");
        assert_eq!(details.treatments[0].kind, TreatmentKind::Organic);
    }

    #[test]
    fn test_from_provider_json_full() {
        let text = r#"```json
        {
            "plant_name": "Tomato",
            "disease_name": "Late Blight",
            "confidence": 0.92,
            "details": {
                "description": "Large dark patches",
                "treatment": "Copper fungicide",
                "prevention": "Avoid overhead watering"
            }
        }
        ```"#;
        let result = from_provider_json(text).unwrap();
        assert_eq!(result.plant_name(), "Tomato");
        assert_eq!(result.disease_name(), "Late Blight");
        let details = result.details().unwrap();
        assert_eq!(details.severity, DEFAULT_REMOTE_SEVERITY);
        assert_eq!(details.treatments.len(), 1);
        assert_eq!(details.treatments[0].kind, TreatmentKind::General);
        assert_eq!(details.treatments[0].description, "Copper fungicide");
        assert_eq!(details.treatments[0].cost_approx.as_deref(), Some("Varies"));
    }

    #[test]
    fn test_missing_details_is_none() {
        let result =
            from_provider_json(r#"{"plant_name": "Rose", "disease_name": "Black spot"}"#).unwrap();
        assert!(result.details().is_none());
        assert_eq!(result.confidence(), 0.0);
    }

    #[test]
    fn test_missing_keys_default() {
        let result = from_provider_json("{}").unwrap();
        assert_eq!(result.plant_name(), UNKNOWN);
        assert_eq!(result.disease_name(), UNKNOWN);
        assert_eq!(result.confidence(), 0.0);
    }

    #[test]
    fn test_lenient_values() {
        let result = from_provider_json(
            r#"{"confidence": "0.75", "details": {"treatment": {"organic": "Neem", "chemical": "Mancozeb"}}}"#,
        )
        .unwrap();
        assert!((result.confidence() - 0.75).abs() < 1e-6);
        let treatment = &result.details().unwrap().treatments[0].description;
        assert!(treatment.contains("organic: Neem"));
        assert!(treatment.contains("chemical: Mancozeb"));
    }

    #[test]
    fn test_percentage_confidence_is_scaled() {
        for text in [
            r#"{"confidence": "85%"}"#,
            r#"{"confidence": " 85 % "}"#,
            r#"{"confidence": 85}"#,
            r#"{"confidence": "85"}"#,
        ] {
            let result = from_provider_json(text).unwrap();
            assert!((result.confidence() - 0.85).abs() < 1e-6, "{text}");
        }

        let fraction = from_provider_json(r#"{"confidence": 0.8}"#).unwrap();
        assert!((fraction.confidence() - 0.8).abs() < 1e-6);
        let certain = from_provider_json(r#"{"confidence": 1}"#).unwrap();
        assert_eq!(certain.confidence(), 1.0);
        let out_of_range = from_provider_json(r#"{"confidence": 250}"#).unwrap();
        assert_eq!(out_of_range.confidence(), 1.0);
    }

    #[test]
    fn test_not_json_is_error() {
        assert!(from_provider_json("I think this is a tomato").is_err());
        assert!(from_provider_json("[1, 2]").is_err());
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }
}
