//! Garden plants and care logs

use super::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use verdant_store::{GardenLog, GardenPlant, NewGardenLog, NewGardenPlant};

async fn add_plant(
    State(state): State<AppState>,
    Json(plant): Json<NewGardenPlant>,
) -> Result<Json<GardenPlant>, ApiError> {
    Ok(Json(state.garden.add_plant(plant).await?))
}

async fn list_plants(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<GardenPlant>>, ApiError> {
    Ok(Json(state.garden.list_plants(user_id).await?))
}

async fn delete_plant(
    State(state): State<AppState>,
    Path(plant_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.garden.delete_plant(plant_id).await?;
    Ok(Json(json!({ "message": "Plant deleted successfully" })))
}

async fn add_log(
    State(state): State<AppState>,
    Json(log): Json<NewGardenLog>,
) -> Result<Json<GardenLog>, ApiError> {
    Ok(Json(state.garden.add_log(log).await?))
}

async fn list_logs(
    State(state): State<AppState>,
    Path(plant_id): Path<i64>,
) -> Result<Json<Vec<GardenLog>>, ApiError> {
    Ok(Json(state.garden.list_logs(plant_id).await?))
}

pub fn garden_routes(state: AppState) -> Router {
    Router::new()
        .route("/my-garden/add", post(add_plant))
        // GET takes a user id, DELETE a plant id
        .route("/my-garden/:id", get(list_plants).delete(delete_plant))
        .route("/my-garden/logs/add", post(add_log))
        .route("/my-garden/logs/:plant_id", get(list_logs))
        .with_state(state)
}
