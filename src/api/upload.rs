//! Photo uploads
//!
//! Files are stored under a generated name so client filenames never touch
//! the filesystem; only a known image extension is kept.

use super::{ApiError, AppState};
use axum::extract::{Multipart, State};
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Generated file name, keeping an image extension when the client sent one
fn stored_name(filename: Option<&str>) -> String {
    let extension = filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));
    match extension {
        Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
        None => Uuid::new_v4().to_string(),
    }
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = stored_name(field.file_name());
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(ApiError::bad_request("Uploaded file is empty"));
        }

        tokio::fs::create_dir_all(&state.uploads_dir)
            .await
            .map_err(|e| {
                error!("Failed to create upload directory: {}", e);
                ApiError::internal()
            })?;
        tokio::fs::write(state.uploads_dir.join(&name), &bytes)
            .await
            .map_err(|e| {
                error!("Failed to store upload: {}", e);
                ApiError::internal()
            })?;

        info!(file = %name, bytes = bytes.len(), "Upload stored");
        return Ok(Json(json!({ "url": format!("/uploads/{name}") })));
    }
    Err(ApiError::bad_request("No file uploaded"))
}

pub fn upload_routes(state: AppState) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .with_state(state)
}
