//! GET /api/health - Database ping

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::api::middleware::{ApiError, AppState};

pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state
        .pool
        .ping()
        .await
        .map_err(|e| ApiError::internal(format!("Health check failed: {:#}", e)))?;
    Ok(Json(json!({ "status": "ok" })))
}
