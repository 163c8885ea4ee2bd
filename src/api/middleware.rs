//! API middleware and shared request plumbing
//!
//! Contains:
//! - `AppState`, the services shared by every handler
//! - `ApiError`, the JSON error body (`{error, details?}`)
//! - Authentication (session token validation) and role checks
//! - Extractors for the client IP and the signed-in admin

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Duration;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::cache::MemoryCache;
use crate::config::{AuthConfig, Config, UploadConfig};
use crate::db::repositories::{
    SqlxAdminRepository, SqlxArticleRepository, SqlxCatalogRepository, SqlxGlobalSettingsRepository,
    SqlxLegalPageRepository, SqlxMessageRepository, SqlxRateLimitRepository, SqlxSessionRepository,
};
use crate::db::DynDatabasePool;
use crate::models::{AdminIdentity, AdminRole};
use crate::services::{
    ArticleService, ArticleServiceError, AuthError, AuthService, CatalogService, CatalogServiceError,
    LegalPageService, LegalPageServiceError, MessageService, MessageServiceError, RateLimiter,
    SettingsService, SettingsServiceError,
};

/// Name of the admin session cookie
pub const SESSION_COOKIE: &str = "admin_session";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub auth_service: Arc<AuthService>,
    pub article_service: Arc<ArticleService>,
    pub legal_page_service: Arc<LegalPageService>,
    pub message_service: Arc<MessageService>,
    pub catalog_service: Arc<CatalogService>,
    pub settings_service: Arc<SettingsService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub auth_config: Arc<AuthConfig>,
    pub upload_config: Arc<UploadConfig>,
}

impl AppState {
    /// Wire repositories and services over a migrated pool
    pub fn new(pool: DynDatabasePool, cache: Arc<MemoryCache>, config: &Config) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(
            SqlxRateLimitRepository::boxed(pool.clone()),
            Duration::minutes(config.rate_limit.window_minutes),
        ));

        let auth_service = AuthService::new(
            SqlxAdminRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            rate_limiter.clone(),
            Duration::days(config.auth.session_days),
            config.rate_limit.login_max,
        );
        let message_service = MessageService::new(
            SqlxMessageRepository::boxed(pool.clone()),
            rate_limiter.clone(),
            config.rate_limit.contact_max,
        );

        Self {
            auth_service: Arc::new(auth_service),
            article_service: Arc::new(ArticleService::new(SqlxArticleRepository::boxed(pool.clone()))),
            legal_page_service: Arc::new(LegalPageService::new(SqlxLegalPageRepository::boxed(pool.clone()))),
            message_service: Arc::new(message_service),
            catalog_service: Arc::new(CatalogService::new(
                SqlxCatalogRepository::boxed(pool.clone()),
                cache.clone(),
            )),
            settings_service: Arc::new(SettingsService::new(
                SqlxGlobalSettingsRepository::boxed(pool.clone()),
                cache,
            )),
            rate_limiter,
            auth_config: Arc::new(config.auth.clone()),
            upload_config: Arc::new(config.upload.clone()),
            pool,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// One failed validation rule, addressed by its camelCase field path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: Vec<serde_json::Value>,
    pub code: String,
    pub message: String,
}

/// Error response body: `{error, details?}` (plus `retryAfterMinutes` on 429)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationIssue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_minutes: Option<i64>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
            retry_after_minutes: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn validation(details: Vec<ValidationIssue>) -> Self {
        Self {
            details: Some(details),
            ..Self::bad_request("Invalid data")
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn too_many_requests(retry_after_minutes: i64) -> Self {
        Self {
            retry_after_minutes: Some(retry_after_minutes),
            ..Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                format!(
                    "Too many requests. Please try again in {} minutes.",
                    retry_after_minutes
                ),
            )
        }
    }

    /// Log the cause and answer with a generic 500
    pub fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, "Request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let retry_after = self.retry_after_minutes;
        let mut response = (status, Json(self)).into_response();
        if let Some(minutes) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&(minutes * 60).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, "Invalid email or password")
            }
            AuthError::RateLimited { retry_after_minutes } => Self::too_many_requests(retry_after_minutes),
            AuthError::Internal(e) => Self::internal(format!("{:#}", e)),
        }
    }
}

impl From<ArticleServiceError> for ApiError {
    fn from(err: ArticleServiceError) -> Self {
        match err {
            ArticleServiceError::NotFound => Self::not_found("Article not found"),
            ArticleServiceError::Validation(msg) => Self::bad_request(msg),
            ArticleServiceError::DuplicateSlug(_) => {
                Self::conflict("An article with this slug already exists")
            }
            ArticleServiceError::Internal(e) => Self::internal(format!("{:#}", e)),
        }
    }
}

impl From<LegalPageServiceError> for ApiError {
    fn from(err: LegalPageServiceError) -> Self {
        match err {
            LegalPageServiceError::NotFound => Self::not_found("Legal page not found"),
            LegalPageServiceError::DuplicateSlug(_) => {
                Self::conflict("A legal page with this slug already exists")
            }
            LegalPageServiceError::Internal(e) => Self::internal(format!("{:#}", e)),
        }
    }
}

impl From<MessageServiceError> for ApiError {
    fn from(err: MessageServiceError) -> Self {
        match err {
            MessageServiceError::NotFound => Self::not_found("Message not found"),
            MessageServiceError::RateLimited { retry_after_minutes } => {
                Self::too_many_requests(retry_after_minutes)
            }
            MessageServiceError::Internal(e) => Self::internal(format!("{:#}", e)),
        }
    }
}

impl From<CatalogServiceError> for ApiError {
    fn from(err: CatalogServiceError) -> Self {
        match err {
            CatalogServiceError::NotFound(_) => Self::not_found(err.to_string()),
            CatalogServiceError::Internal(e) => Self::internal(format!("{:#}", e)),
        }
    }
}

impl From<SettingsServiceError> for ApiError {
    fn from(err: SettingsServiceError) -> Self {
        Self::internal(err)
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Signed-in admin, inserted by [`require_auth`]
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin(pub AdminIdentity);

/// Session token from `Authorization: Bearer` or, failing that, the
/// `admin_session` cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|cookie| {
            cookie
                .trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .map(str::to_string)
        })
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers()).ok_or_else(ApiError::unauthorized)?;

    let identity = state
        .auth_service
        .validate_session(&token)
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    request.extensions_mut().insert(AuthenticatedAdmin(identity));
    Ok(next.run(request).await)
}

/// Admin-role middleware; layer it inside [`require_auth`]
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let admin = request
        .extensions()
        .get::<AuthenticatedAdmin>()
        .ok_or_else(ApiError::unauthorized)?;

    if admin.0.role != AdminRole::Admin {
        return Err(ApiError::forbidden());
    }

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAdmin>()
            .cloned()
            .ok_or_else(ApiError::unauthorized)
    }
}

// ============================================================================
// Client IP
// ============================================================================

/// Client address: first `X-Forwarded-For` entry, then `X-Real-IP`, then
/// the socket peer, else `unknown`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

pub fn extract_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    forwarded.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = extract_ip(&parts.headers)
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ClientIp(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_token_from_cookie() {
        let h = headers(&[("cookie", "theme=dark; admin_session=abc-123; other=1")]);
        assert_eq!(extract_session_token(&h).as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_bearer_takes_priority() {
        let h = headers(&[
            ("authorization", "Bearer from-header"),
            ("cookie", "admin_session=from-cookie"),
        ]);
        assert_eq!(extract_session_token(&h).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_similar_cookie_names_are_ignored() {
        let h = headers(&[("cookie", "admin_session_old=x; session=y")]);
        assert_eq!(extract_session_token(&h), None);
        assert_eq!(extract_session_token(&headers(&[("cookie", "admin_session=")])), None);
    }

    #[test]
    fn test_extract_ip_order() {
        let h = headers(&[
            ("x-forwarded-for", "203.0.113.1, 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(extract_ip(&h).as_deref(), Some("203.0.113.1"));

        let h = headers(&[("x-real-ip", "198.51.100.2")]);
        assert_eq!(extract_ip(&h).as_deref(), Some("198.51.100.2"));

        assert_eq!(extract_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_rate_limit_error_body() {
        let err = ApiError::too_many_requests(7);
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
        let body = serde_json::to_value(&err).unwrap();
        assert_eq!(body["error"], "Too many requests. Please try again in 7 minutes.");
        assert_eq!(body["retryAfterMinutes"], 7);
        assert!(body.get("details").is_none());

        let response = err.into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "420");
    }

    #[test]
    fn test_internal_error_is_generic() {
        let err = ApiError::from(ArticleServiceError::Internal(anyhow::anyhow!("db exploded")));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error, "Internal server error");
    }
}
