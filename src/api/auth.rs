//! Admin authentication endpoints
//!
//! - POST /api/admin/auth/login - Sign in, sets the session cookie
//! - POST /api/admin/auth/logout - Delete the session, clears the cookie
//! - GET /api/admin/auth/me - Current admin

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::middleware::{
    extract_session_token, ApiError, AppState, AuthenticatedAdmin, ClientIp, SESSION_COOKIE,
};
use crate::api::validation::ValidJson;
use crate::models::AdminIdentity;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    #[serde(default)]
    pub email: String,
    #[validate(length(min = 1))]
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub admin: AdminIdentity,
    pub token: String,
}

/// Routes reachable without a session
pub fn public_router() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// Routes behind `require_auth`
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

fn session_cookie(value: &str, max_age: i64, secure: bool) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, value, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(ApiError::internal)
}

/// POST /api/admin/auth/login
async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ValidJson(body): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (session, admin) = state
        .auth_service
        .login(&ip, &body.email, &body.password)
        .await?;

    let max_age = state.auth_service.session_lifetime().num_seconds();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session_cookie(&session.token, max_age, state.auth_config.cookie_secure)?,
    );

    Ok((
        headers,
        Json(AuthResponse {
            admin: admin.identity(),
            token: session.token,
        }),
    ))
}

/// POST /api/admin/auth/logout
async fn logout(
    State(state): State<AppState>,
    _admin: AuthenticatedAdmin,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_session_token(&headers).ok_or_else(ApiError::unauthorized)?;
    state.auth_service.logout(&token).await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        session_cookie("", 0, state.auth_config.cookie_secure)?,
    );
    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/admin/auth/me
async fn me(AuthenticatedAdmin(admin): AuthenticatedAdmin) -> Json<AdminIdentity> {
    Json(admin)
}
