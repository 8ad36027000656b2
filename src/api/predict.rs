//! Image diagnosis
//!
//! `POST /predict` takes a multipart `file` and an optional `language`.
//! Any readable upload gets a 200 with a diagnosis; the pipeline never fails.

use super::{ApiError, AppState};
use axum::extract::{Multipart, State};
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use tracing::info;
use verdant_core::{DiagnosisResult, ImageInput};

/// Fields read from a diagnosis upload
#[derive(Debug, Default)]
struct PredictForm {
    file: Option<(Vec<u8>, Option<String>)>,
    language: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<PredictForm, ApiError> {
    let mut form = PredictForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                form.file = Some((bytes.to_vec(), filename));
            }
            Some("language") => {
                form.language = Some(field.text().await?);
            }
            _ => {}
        }
    }
    Ok(form)
}

async fn predict(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DiagnosisResult>, ApiError> {
    let form = read_form(multipart).await?;

    let (bytes, filename) = form
        .file
        .ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    let language = form
        .language
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| state.default_language.clone());

    let image = ImageInput::new(bytes, filename);
    info!(
        bytes = image.len(),
        mime = %image.mime_type(),
        language = %language,
        "Diagnosis requested"
    );

    Ok(Json(state.pipeline.diagnose_in(&image, &language).await))
}

pub fn predict_routes(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{body_json, multipart_request, state_with, test_state};
    use axum::http::StatusCode;
    use std::sync::Arc;
    use tower::ServiceExt;
    use verdant_core::mock::MockProvider;
    use verdant_core::{DiagnosisPipeline, StaticFallback};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[tokio::test]
    async fn test_predict_local_result() {
        let app = predict_routes(test_state().await);
        let response = app
            .oneshot(multipart_request(
                "/predict",
                &[("file", Some("leaf.png"), PNG)],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["plant_name"], "Tomato");
        assert_eq!(body["disease_name"], "Early blight");
    }

    #[tokio::test]
    async fn test_corrupt_image_still_200() {
        let pipeline = DiagnosisPipeline::new().with_tier(Arc::new(MockProvider::failing("gemini")));
        let app = predict_routes(state_with(pipeline, std::env::temp_dir()).await);
        let response = app
            .oneshot(multipart_request(
                "/predict",
                &[("file", Some("x.jpg"), b"not an image"), ("language", None, b"en")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["plant_name"], StaticFallback::PLANT_NAME);
        assert_eq!(body["confidence"], 0.0);
    }

    #[tokio::test]
    async fn test_missing_file_is_400() {
        let app = predict_routes(test_state().await);
        let response = app
            .oneshot(multipart_request("/predict", &[("language", None, b"fr")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "No file uploaded");
    }

    #[tokio::test]
    async fn test_empty_file_is_400() {
        let app = predict_routes(test_state().await);
        let response = app
            .oneshot(multipart_request("/predict", &[("file", Some("a.jpg"), b"")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_400() {
        let app = predict_routes(test_state().await)
            .layer(axum::extract::DefaultBodyLimit::max(64));
        let big = vec![0u8; 4096];
        let response = app
            .oneshot(multipart_request("/predict", &[("file", Some("big.jpg"), &big)]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
