//! Article API endpoints
//!
//! Public:
//! - GET /api/public/articles - Published articles, newest first
//! - GET /api/public/articles/{slug} - One published article
//!
//! Admin:
//! - GET /api/admin/articles - Paged list (`deleted=true` lists the trash)
//! - POST /api/admin/articles - Create
//! - GET/PUT/DELETE /api/admin/articles/{id} - Read, replace, soft delete
//! - POST /api/admin/articles/{id}/restore - Undo a soft delete

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{default_page, default_per_page};
use crate::api::extract::{ApiPath, ApiQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::api::validation::ValidJson;
use crate::models::{Article, ArticleInput, ListParams, PagedResult, PublicArticleFilter};

const DEFAULT_PUBLIC_LIMIT: i64 = 20;
const MAX_PUBLIC_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct PublicArticlesQuery {
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub limit: Option<i64>,
}

impl PublicArticlesQuery {
    fn into_filter(self) -> PublicArticleFilter {
        PublicArticleFilter {
            category: self.category.filter(|c| !c.trim().is_empty()),
            featured: self.featured,
            limit: self
                .limit
                .unwrap_or(DEFAULT_PUBLIC_LIMIT)
                .clamp(1, MAX_PUBLIC_LIMIT),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminArticlesQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub deleted: bool,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_public))
        .route("/{slug}", get(get_public))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_admin).post(create))
        .route("/{id}", get(get_by_id).put(update).delete(delete))
        .route("/{id}/restore", post(restore))
}

/// GET /api/public/articles
async fn list_public(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PublicArticlesQuery>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let articles = state
        .article_service
        .list_public(&query.into_filter())
        .await?;
    Ok(Json(articles))
}

/// GET /api/public/articles/{slug}
async fn get_public(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.article_service.get_public_by_slug(&slug).await?))
}

/// GET /api/admin/articles
async fn list_admin(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AdminArticlesQuery>,
) -> Result<Json<PagedResult<Article>>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);
    let result = state
        .article_service
        .list_admin(query.deleted, &params)
        .await?;
    Ok(Json(result))
}

/// POST /api/admin/articles
async fn create(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<ArticleInput>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    let article = state.article_service.create(&input).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

/// GET /api/admin/articles/{id}
async fn get_by_id(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.article_service.get(id).await?))
}

/// PUT /api/admin/articles/{id}
async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ValidJson(input): ValidJson<ArticleInput>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.article_service.update(id, &input).await?))
}

/// DELETE /api/admin/articles/{id}
async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.article_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/articles/{id}/restore
async fn restore(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.article_service.restore(id).await?))
}
