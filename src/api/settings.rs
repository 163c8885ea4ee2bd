//! Global settings endpoints
//!
//! - GET /api/public/global-settings
//! - GET /api/admin/global-settings
//! - PUT /api/admin/global-settings (admin role)

use axum::{
    extract::State,
    middleware as axum_middleware,
    routing::{get, put},
    Json, Router,
};

use crate::api::middleware::{require_admin, ApiError, AppState};
use crate::api::validation::ValidJson;
use crate::models::{GlobalSettings, GlobalSettingsInput};

pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(get_settings))
}

/// Editors may read, only admins may write
pub fn admin_router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(get_settings)
            .merge(put(update_settings).route_layer(axum_middleware::from_fn(require_admin))),
    )
}

async fn get_settings(State(state): State<AppState>) -> Result<Json<GlobalSettings>, ApiError> {
    Ok(Json(state.settings_service.get().await?))
}

async fn update_settings(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<GlobalSettingsInput>,
) -> Result<Json<GlobalSettings>, ApiError> {
    Ok(Json(state.settings_service.update(&input).await?))
}
