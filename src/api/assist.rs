//! Gardening assistant
//!
//! `POST /ask-google` forwards a question to the text generator. The
//! endpoint always answers; an unavailable generator yields a fixed reply.

use super::AppState;
use axum::extract::State;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Reply when no generator is configured or the call fails
pub const UNAVAILABLE_ANSWER: &str = "Sorry, I couldn't connect to Google right now.";

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

async fn ask(State(state): State<AppState>, Json(request): Json<AskRequest>) -> Json<AskResponse> {
    let answer = match &state.assistant {
        Some(generator) => match generator.generate_text(&request.query).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(kind = e.kind(), "Assistant request failed: {}", e);
                UNAVAILABLE_ANSWER.to_string()
            }
        },
        None => UNAVAILABLE_ANSWER.to_string(),
    };
    Json(AskResponse { answer })
}

pub fn assist_routes(state: AppState) -> Router {
    Router::new()
        .route("/ask-google", post(ask))
        .with_state(state)
}
