//! Tests for Gemini provider

use super::config::{GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT};
use super::provider::{build_diagnosis_request, build_text_request, GeminiProvider};
use super::types::GeminiResponse;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use verdant_core::{DiagnosisProvider, ImageInput, ProviderError, ProviderOutcome, TextGenerator};

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

#[test]
fn test_config_builder() {
    let config = GeminiConfig::new("test-key")
        .with_model("gemini-2.5-flash-lite")
        .with_timeout(Duration::from_secs(5));

    assert_eq!(config.api_key, "test-key");
    assert_eq!(config.model, "gemini-2.5-flash-lite");
    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(
        config.generate_url(),
        format!("{DEFAULT_BASE_URL}/models/gemini-2.5-flash-lite:generateContent")
    );
}

#[test]
fn test_config_defaults() {
    let config = GeminiConfig::new("k");
    assert_eq!(config.model, DEFAULT_MODEL);
    assert_eq!(config.timeout, DEFAULT_TIMEOUT);
}

#[test]
fn test_debug_masks_key() {
    let config = GeminiConfig::new("AIza1234567890abcdefghij");
    let debug = format!("{config:?}");
    assert!(debug.contains("AIza...ghij"));
    assert!(!debug.contains("1234567890"));
}

#[test]
fn test_png_request_carries_png_mime() {
    let image = ImageInput::new(PNG_MAGIC.to_vec(), Some("leaf.png".into()));
    let body = serde_json::to_value(build_diagnosis_request(&image, 0.2)).unwrap();

    let parts = &body["contents"][0]["parts"];
    assert!(parts[0]["text"].as_str().unwrap().contains("plant_name"));
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[1]["inlineData"]["data"], "iVBORw0KGgoAAAAN");
    assert_eq!(
        body["generationConfig"]["responseMimeType"],
        "application/json"
    );
    assert_eq!(
        body["generationConfig"]["responseSchema"]["required"][0],
        "plant_name"
    );
}

#[test]
fn test_text_request_shape() {
    let body = serde_json::to_value(build_text_request("How often should I water basil?")).unwrap();
    assert_eq!(
        body["contents"][0]["parts"][0]["text"],
        "How often should I water basil?"
    );
    assert!(body.get("generationConfig").is_none());
}

#[test]
fn test_response_text_extraction() {
    let response: GeminiResponse = serde_json::from_value(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": "{\"plant_name\":"}, {"text": "\"Rose\"}"}]},
            "finishReason": "STOP"
        }]
    }))
    .unwrap();
    assert_eq!(response.text().as_deref(), Some("{\"plant_name\":\"Rose\"}"));

    let empty: GeminiResponse = serde_json::from_value(json!({"candidates": []})).unwrap();
    assert!(empty.text().is_none());
}

// Fake endpoint tests

#[derive(Clone, Default)]
struct Captured {
    body: Arc<Mutex<Option<Value>>>,
    api_key: Arc<Mutex<Option<String>>>,
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn candidate(text: &str) -> Value {
    json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}, "finishReason": "STOP"}]})
}

async fn fake_gemini(reply: Value, status: StatusCode) -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route(
            "/models/:call",
            post(
                move |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| {
                    let reply = reply.clone();
                    async move {
                        *captured.body.lock().unwrap() = Some(body);
                        *captured.api_key.lock().unwrap() = headers
                            .get("x-goog-api-key")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        (status, Json(reply))
                    }
                },
            ),
        )
        .with_state(captured.clone());
    (spawn(app).await, captured)
}

fn provider(base_url: &str) -> GeminiProvider {
    GeminiProvider::new(GeminiConfig::new("test-api-key-123456").with_base_url(base_url)).unwrap()
}

#[tokio::test]
async fn test_analyze_success_over_http() {
    let reply = candidate(
        r#"{"plant_name": "Tomato", "disease_name": "Late Blight", "confidence": 0.9,
            "details": {"description": "Dark patches", "treatment": "Copper spray", "prevention": "Dry leaves"}}"#,
    );
    let (base_url, captured) = fake_gemini(reply, StatusCode::OK).await;

    let image = ImageInput::new(PNG_MAGIC.to_vec(), Some("leaf.png".into()));
    let outcome = provider(&base_url).analyze(&image).await;

    let ProviderOutcome::Success(result) = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(result.disease_name(), "Late Blight");
    assert_eq!(result.details().unwrap().treatments[0].description, "Copper spray");

    let body = captured.body.lock().unwrap().clone().unwrap();
    assert_eq!(
        body["contents"][0]["parts"][1]["inlineData"]["mimeType"],
        "image/png"
    );
    // Key travels in the header only
    assert_eq!(
        captured.api_key.lock().unwrap().as_deref(),
        Some("test-api-key-123456")
    );
}

#[tokio::test]
async fn test_analyze_fenced_json() {
    let reply = candidate("```json\n{\"plant_name\": \"Corn\", \"disease_name\": \"Rust\", \"confidence\": \"0.7\"}\n```");
    let (base_url, _) = fake_gemini(reply, StatusCode::OK).await;

    let outcome = provider(&base_url)
        .analyze(&ImageInput::new(vec![1, 2, 3], None))
        .await;
    let ProviderOutcome::Success(result) = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(result.plant_name(), "Corn");
    assert!(result.details().is_none());
}

#[tokio::test]
async fn test_analyze_non_json_text_fails() {
    let reply = candidate("This looks like a healthy tomato plant!");
    let (base_url, _) = fake_gemini(reply, StatusCode::OK).await;

    let outcome = provider(&base_url)
        .analyze(&ImageInput::new(vec![1, 2, 3], None))
        .await;
    assert!(matches!(outcome, ProviderOutcome::Failure(ProviderError::Parse(_))));
}

#[tokio::test]
async fn test_analyze_empty_candidates_fails() {
    let (base_url, _) = fake_gemini(json!({"candidates": []}), StatusCode::OK).await;

    let outcome = provider(&base_url)
        .analyze(&ImageInput::new(vec![1, 2, 3], None))
        .await;
    assert!(matches!(outcome, ProviderOutcome::Failure(ProviderError::Parse(_))));
}

#[tokio::test]
async fn test_http_error_is_sanitized() {
    let reply = json!({"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}});
    let (base_url, _) = fake_gemini(reply, StatusCode::BAD_REQUEST).await;

    let outcome = provider(&base_url)
        .analyze(&ImageInput::new(vec![1, 2, 3], None))
        .await;
    match outcome {
        ProviderOutcome::Failure(ProviderError::Status { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("authentication"));
            assert!(!message.contains("not valid"));
        }
        other => panic!("expected status failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_failure() {
    // Bind and drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let outcome = provider(&format!("http://{addr}"))
        .analyze(&ImageInput::new(vec![1, 2, 3], None))
        .await;
    assert!(matches!(outcome, ProviderOutcome::Failure(ProviderError::Transport(_))));
}

#[tokio::test]
async fn test_generate_text() {
    let (base_url, captured) = fake_gemini(candidate("Water twice a week."), StatusCode::OK).await;

    let answer = provider(&base_url)
        .generate_text("How often should I water basil?")
        .await
        .unwrap();
    assert_eq!(answer, "Water twice a week.");

    let body = captured.body.lock().unwrap().clone().unwrap();
    assert_eq!(
        body["contents"][0]["parts"][0]["text"],
        "How often should I water basil?"
    );
}

#[test]
fn test_provider_name_includes_model() {
    let provider = GeminiProvider::new(GeminiConfig::new("k").with_model("gemini-2.5-flash-lite")).unwrap();
    assert_eq!(provider.name(), "gemini:gemini-2.5-flash-lite");
}
