//! Tests for the pipeline module

use super::*;
use crate::diagnosis::{DiagnosisDetails, Treatment, TreatmentKind};
use crate::mock::{MockClassifier, MockProvider, MockReference};
use crate::prediction::{ClassifierPrediction, MODEL_NOT_LOADED_LABEL};
use crate::reference::ReferenceDisease;
use crate::translate::{MockTextGenerator, Translator};

fn image() -> ImageInput {
    ImageInput::new(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00], Some("leaf.jpg".into()))
}

fn remote_result() -> DiagnosisResult {
    DiagnosisResult::new("Tomato", "Late Blight", 0.92).with_details(DiagnosisDetails {
        description: "Large dark patches".into(),
        severity: "Moderate".into(),
        prevention: "Avoid overhead watering".into(),
        treatments: vec![Treatment::new(TreatmentKind::General, "Copper fungicide").with_cost("Varies")],
    })
}

fn early_blight() -> ReferenceDisease {
    ReferenceDisease {
        name: "Early Blight".into(),
        plant: Some("Tomato".into()),
        severity: "Moderate".into(),
        symptoms: "Dark spots on leaves, yellowing.".into(),
        prevention: "Crop rotation, proper spacing.".into(),
        treatments: vec![
            Treatment::new(TreatmentKind::Organic, "Spray Neem oil every 7 days.")
                .with_cost("$5 - $10"),
        ],
    }
}

fn local(label: &str, confidence: f32) -> Arc<LocalTier> {
    Arc::new(LocalTier::new(Arc::new(MockClassifier::new(label, confidence, 0.4))))
}

#[tokio::test]
async fn test_confident_local_short_circuits() {
    let remote = Arc::new(MockProvider::succeeding("gemini", remote_result()));
    let tier = LocalTier::new(Arc::new(MockClassifier::new("Tomato__Early_blight", 0.93, 0.4)))
        .with_reference(Arc::new(MockReference::new(vec![early_blight()])));
    let pipeline = DiagnosisPipeline::new()
        .with_tier(Arc::new(tier))
        .with_tier(remote.clone());

    let report = pipeline.diagnose_report(&image()).await;
    assert_eq!(report.resolved_by, "mock-classifier");
    assert_eq!(report.result.plant_name(), "Tomato");
    assert_eq!(report.result.disease_name(), "Early blight");
    assert_eq!(
        report.result.details().unwrap().prevention,
        "Crop rotation, proper spacing."
    );
    assert_eq!(remote.calls(), 0);
    assert_eq!(report.attempts.len(), 1);
}

#[tokio::test]
async fn test_primary_success_skips_secondary() {
    let primary = Arc::new(MockProvider::succeeding("gemini", remote_result()));
    let secondary = Arc::new(MockProvider::succeeding(
        "huggingface",
        DiagnosisResult::new("Unknown", "Visual Analysis Complete", 0.85),
    ));
    let pipeline = DiagnosisPipeline::new()
        .with_tier(local("Tomato__Healthy", 0.12))
        .with_tier(primary.clone())
        .with_tier(secondary.clone());

    let report = pipeline.diagnose_report(&image()).await;
    assert_eq!(report.resolved_by, "gemini");
    assert_eq!(report.result, remote_result());
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 0);
    assert_eq!(report.attempts[0].status, AttemptStatus::Skipped);
    assert_eq!(report.attempts[1].status, AttemptStatus::Success);
}

#[tokio::test]
async fn test_failure_moves_to_next_tier() {
    let primary = Arc::new(MockProvider::failing("gemini"));
    let secondary = Arc::new(MockProvider::succeeding("huggingface", remote_result()));
    let pipeline = DiagnosisPipeline::new()
        .with_tier(local("Tomato__Healthy", 0.2))
        .with_tier(primary.clone())
        .with_tier(secondary.clone());

    let report = pipeline.diagnose_report(&image()).await;
    assert_eq!(report.resolved_by, "huggingface");
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 1);
    assert_eq!(report.attempts[1].status, AttemptStatus::Failure);
}

#[tokio::test]
async fn test_exhaustion_returns_static_fallback() {
    let pipeline = DiagnosisPipeline::new()
        .with_tier(local("Tomato__Healthy", 0.1))
        .with_tier(Arc::new(MockProvider::failing("gemini")))
        .with_tier(Arc::new(MockProvider::failing("huggingface")));

    let report = pipeline.diagnose_report(&image()).await;
    assert!(report.is_terminal());
    assert_eq!(report.result.plant_name(), StaticFallback::PLANT_NAME);
    assert_eq!(report.result.disease_name(), StaticFallback::DISEASE_NAME);
    assert_eq!(report.result.confidence(), 0.0);
    assert!(report.result.details().is_some());
    assert_eq!(report.attempts.len(), 3);
}

#[tokio::test]
async fn test_empty_pipeline_is_total() {
    let result = DiagnosisPipeline::new().diagnose(&ImageInput::new(Vec::new(), None)).await;
    assert_eq!(result.plant_name(), StaticFallback::PLANT_NAME);
}

#[tokio::test]
async fn test_model_not_loaded_escalates() {
    let classifier =
        MockClassifier::with_prediction(ClassifierPrediction::error(MODEL_NOT_LOADED_LABEL));
    let remote = Arc::new(MockProvider::succeeding("gemini", remote_result()));
    let pipeline = DiagnosisPipeline::new()
        .with_tier(Arc::new(LocalTier::new(Arc::new(classifier))))
        .with_tier(remote.clone());

    let report = pipeline.diagnose_report(&image()).await;
    assert_eq!(report.resolved_by, "gemini");
    assert_eq!(
        report.attempts[0].detail.as_deref(),
        Some(MODEL_NOT_LOADED_LABEL)
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_tier_times_out() {
    let slow = Arc::new(MockProvider::succeeding("gemini", remote_result()).with_delay(Duration::from_secs(60)));
    let backup = Arc::new(MockProvider::succeeding("huggingface", remote_result()));
    let pipeline = DiagnosisPipeline::new()
        .with_tier(slow.clone())
        .with_tier(backup.clone())
        .with_tier_timeout(Duration::from_secs(5));

    let report = pipeline.diagnose_report(&image()).await;
    assert_eq!(report.resolved_by, "huggingface");
    assert_eq!(report.attempts[0].status, AttemptStatus::Failure);
    assert!(report.attempts[0]
        .detail
        .as_deref()
        .unwrap()
        .contains("timed out"));
}

#[tokio::test]
async fn test_panicking_tier_is_absorbed() {
    let pipeline = DiagnosisPipeline::new()
        .with_tier(Arc::new(MockProvider::new("gemini").panicking()))
        .with_tier(Arc::new(MockProvider::succeeding("huggingface", remote_result())));

    let report = pipeline.diagnose_report(&image()).await;
    assert_eq!(report.resolved_by, "huggingface");
    let detail = report.attempts[0].detail.clone().unwrap();
    assert!(detail.contains("panicked"), "{detail}");
}

#[tokio::test]
async fn test_broken_reference_still_resolves() {
    let tier = LocalTier::new(Arc::new(MockClassifier::new("Tomato__Early_blight", 0.8, 0.4)))
        .with_reference(Arc::new(MockReference::broken()));
    let pipeline = DiagnosisPipeline::new().with_tier(Arc::new(tier));

    let result = pipeline.diagnose(&image()).await;
    assert_eq!(result.disease_name(), "Early blight");
    assert!(result.details().is_none());
}

#[tokio::test]
async fn test_diagnose_in_translates() {
    let mut generator = MockTextGenerator::new();
    generator.expect_generate_text().times(1).returning(|_| {
        Ok(r#"{"plant_name": "Tomate", "disease_name": "Mildiou", "confidence": 0.92,
               "details": {"description": "Grandes taches", "severity": "Modérée",
                           "prevention": "Éviter l'arrosage par le haut",
                           "treatments": [{"type": "General", "description": "Fongicide cuivré", "cost_approx": "Variable"}]}}"#
            .to_string())
    });
    let pipeline = DiagnosisPipeline::new()
        .with_tier(Arc::new(MockProvider::succeeding("gemini", remote_result())))
        .with_translator(Translator::new(Arc::new(generator)));

    let result = pipeline.diagnose_in(&image(), "fr").await;
    assert_eq!(result.plant_name(), "Tomate");
    assert_eq!(result.disease_name(), "Mildiou");
}

#[tokio::test]
async fn test_fallback_is_not_translated() {
    let mut generator = MockTextGenerator::new();
    generator.expect_generate_text().times(0);
    let pipeline = DiagnosisPipeline::new()
        .with_tier(Arc::new(MockProvider::failing("gemini")))
        .with_translator(Translator::new(Arc::new(generator)));

    let result = pipeline.diagnose_in(&image(), "fr").await;
    assert_eq!(result.plant_name(), StaticFallback::PLANT_NAME);
}

#[test]
fn test_tier_names_in_order() {
    let pipeline = DiagnosisPipeline::new()
        .with_tier(local("Tomato__Healthy", 0.9))
        .with_tier(Arc::new(MockProvider::failing("gemini")))
        .with_tier(Arc::new(MockProvider::failing("huggingface")));
    assert_eq!(
        pipeline.tier_names(),
        vec!["mock-classifier", "gemini", "huggingface"]
    );
}
