//! HTTP API
//!
//! - `health`: liveness and tier overview
//! - `predict`: image diagnosis through the fallback pipeline
//! - `assist`: free-form gardening questions
//! - `auth`: registration and login
//! - `garden`: garden plants and care logs
//! - `upload`: photo uploads served under `/uploads`

pub mod assist;
pub mod auth;
pub mod error;
pub mod garden;
pub mod health;
pub mod predict;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use verdant_core::{Classifier, DiagnosisPipeline, TextGenerator};
use verdant_store::{GardenStore, UserStore};

pub use error::ApiError;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DiagnosisPipeline>,
    pub classifier: Arc<dyn Classifier>,
    pub assistant: Option<Arc<dyn TextGenerator>>,
    pub users: UserStore,
    pub garden: GardenStore,
    pub uploads_dir: PathBuf,
    pub default_language: String,
}

/// Build the full application router
pub fn app_router(state: AppState, max_body_bytes: usize) -> Router {
    let uploads = ServeDir::new(&state.uploads_dir);

    Router::new()
        .merge(health::health_routes(state.clone()))
        .merge(predict::predict_routes(state.clone()))
        .merge(assist::assist_routes(state.clone()))
        .merge(auth::auth_routes(state.clone()))
        .merge(garden::garden_routes(state.clone()))
        .merge(upload::upload_routes(state))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
