//! Catalog endpoints for services, process steps and audiences
//!
//! Each kind gets the same routes:
//! - GET /api/public/{kind} - Active items in display order
//! - GET/POST /api/admin/{kind}
//! - PUT/DELETE /api/admin/{kind}/{id}

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use crate::api::extract::ApiPath;
use crate::api::middleware::{ApiError, AppState};
use crate::api::validation::ValidJson;
use crate::models::{CatalogItem, CatalogItemInput, CatalogKind};

/// Public list routes for every kind, mounted at `/{table}`
pub fn public_router() -> Router<AppState> {
    CatalogKind::ALL
        .into_iter()
        .fold(Router::new(), |router, kind| {
            router.route(
                &format!("/{}", kind.table()),
                get(move |State(state): State<AppState>| list_public(state, kind)),
            )
        })
}

/// Admin routes for one kind
pub fn admin_router(kind: CatalogKind) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(move |State(state): State<AppState>| list_all(state, kind)).post(
                move |State(state): State<AppState>, ValidJson(input): ValidJson<CatalogItemInput>| {
                    create(state, kind, input)
                },
            ),
        )
        .route(
            "/{id}",
            put(
                move |State(state): State<AppState>,
                      ApiPath(id): ApiPath<i64>,
                      ValidJson(input): ValidJson<CatalogItemInput>| {
                    update(state, kind, id, input)
                },
            )
            .delete(move |State(state): State<AppState>, ApiPath(id): ApiPath<i64>| {
                delete(state, kind, id)
            }),
        )
}

async fn list_public(state: AppState, kind: CatalogKind) -> Result<Json<Vec<CatalogItem>>, ApiError> {
    Ok(Json(state.catalog_service.list_public(kind).await?))
}

async fn list_all(state: AppState, kind: CatalogKind) -> Result<Json<Vec<CatalogItem>>, ApiError> {
    Ok(Json(state.catalog_service.list_all(kind).await?))
}

async fn create(
    state: AppState,
    kind: CatalogKind,
    input: CatalogItemInput,
) -> Result<(StatusCode, Json<CatalogItem>), ApiError> {
    let item = state.catalog_service.create(kind, &input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update(
    state: AppState,
    kind: CatalogKind,
    id: i64,
    input: CatalogItemInput,
) -> Result<Json<CatalogItem>, ApiError> {
    Ok(Json(state.catalog_service.update(kind, id, &input).await?))
}

async fn delete(state: AppState, kind: CatalogKind, id: i64) -> Result<StatusCode, ApiError> {
    state.catalog_service.delete(kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
