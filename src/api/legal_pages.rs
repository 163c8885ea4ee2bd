//! Legal page endpoints
//!
//! - GET /api/public/legal-pages/{slug}
//! - GET/POST /api/admin/legal-pages
//! - GET/PUT/DELETE /api/admin/legal-pages/{id}
//!
//! The admin routes require the `admin` role.

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::extract::ApiPath;
use crate::api::middleware::{ApiError, AppState};
use crate::api::validation::ValidJson;
use crate::models::{LegalPage, LegalPageInput};

pub fn public_router() -> Router<AppState> {
    Router::new().route("/{slug}", get(get_by_slug))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_by_id).put(update).delete(delete))
}

async fn get_by_slug(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<LegalPage>, ApiError> {
    Ok(Json(state.legal_page_service.get_by_slug(&slug).await?))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<LegalPage>>, ApiError> {
    Ok(Json(state.legal_page_service.list().await?))
}

async fn create(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<LegalPageInput>,
) -> Result<(StatusCode, Json<LegalPage>), ApiError> {
    let page = state.legal_page_service.create(&input).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn get_by_id(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<LegalPage>, ApiError> {
    Ok(Json(state.legal_page_service.get(id).await?))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ValidJson(input): ValidJson<LegalPageInput>,
) -> Result<Json<LegalPage>, ApiError> {
    Ok(Json(state.legal_page_service.update(id, &input).await?))
}

async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.legal_page_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
