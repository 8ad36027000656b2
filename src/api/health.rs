//! Liveness endpoints
//!
//! - `/` for the original clients' reachability check
//! - `/health` with version, tier order and model state

use super::AppState;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub tiers: Vec<String>,
    pub classifier_loaded: bool,
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Plant Disease Detection API is running" }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        tiers: state.pipeline.tier_names(),
        classifier_loaded: state.classifier.is_loaded(),
    })
}

pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{body_json, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_root_message() {
        let app = health_routes(test_state().await);
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Plant Disease Detection API is running");
    }

    #[tokio::test]
    async fn test_health_lists_tiers() {
        let app = health_routes(test_state().await);
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["tiers"], json!(["mock-classifier", "remote"]));
        assert_eq!(body["classifier_loaded"], true);
    }
}
