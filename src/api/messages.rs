//! Contact form and admin inbox
//!
//! - POST /api/public/contact - Rate-limited per client IP
//! - GET /api/admin/messages - `page`, `perPage`, `archived`, `unread`
//! - PATCH/DELETE /api/admin/messages/{id}

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{default_page, default_per_page};
use crate::api::extract::{ApiPath, ApiQuery};
use crate::api::middleware::{ApiError, AppState, ClientIp};
use crate::api::validation::ValidJson;
use crate::models::{ContactInput, ListParams, Message, MessageFilter, MessageUpdate, PagedResult};

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub unread: bool,
}

/// Inbox page plus the global unread count for the badge
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxResponse {
    #[serde(flatten)]
    pub page: PagedResult<Message>,
    pub unread_count: i64,
}

pub fn contact_router() -> Router<AppState> {
    Router::new().route("/", post(submit))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", patch(update).delete(delete))
}

/// POST /api/public/contact
async fn submit(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ValidJson(input): ValidJson<ContactInput>,
) -> Result<(StatusCode, Json<ContactResponse>), ApiError> {
    let message = state.message_service.submit(&ip, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            id: message.id,
        }),
    ))
}

/// GET /api/admin/messages
async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<InboxQuery>,
) -> Result<Json<InboxResponse>, ApiError> {
    let filter = MessageFilter {
        archived: query.archived,
        unread_only: query.unread,
    };
    let params = ListParams::new(query.page, query.per_page);
    let page = state.message_service.list(filter, &params).await?;
    let unread_count = state.message_service.unread_count().await?;
    Ok(Json(InboxResponse { page, unread_count }))
}

/// PATCH /api/admin/messages/{id}
async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ValidJson(update): ValidJson<MessageUpdate>,
) -> Result<Json<Message>, ApiError> {
    if !update.has_changes() {
        return Err(ApiError::bad_request("Nothing to update"));
    }
    Ok(Json(state.message_service.update(id, &update).await?))
}

/// DELETE /api/admin/messages/{id}
async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.message_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
