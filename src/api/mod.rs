//! API layer - HTTP handlers and routing
//!
//! - `/api/public/*` - Site content, contact form (no auth)
//! - `/api/admin/auth/login` - Sign in (no auth)
//! - `/api/admin/*` - Back office (session required, some routes admin-only)
//! - `/uploads/*` - Uploaded files
//! - `/api/health` - Liveness with a database ping

pub mod articles;
pub mod auth;
pub mod catalog;
pub mod common;
pub mod extract;
pub mod health;
pub mod legal_pages;
pub mod messages;
pub mod middleware;
pub mod settings;
pub mod static_files;
pub mod validation;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::models::CatalogKind;

pub use middleware::{ApiError, AppState};
pub use validation::ValidJson;

/// Public content routes, mounted at `/api/public`
pub fn build_public_router() -> Router<AppState> {
    Router::new()
        .nest("/articles", articles::public_router())
        .nest("/legal-pages", legal_pages::public_router())
        .nest("/global-settings", settings::public_router())
        .nest("/contact", messages::contact_router())
        .merge(catalog::public_router())
}

/// Back-office routes, mounted at `/api/admin`
pub fn build_admin_router(state: AppState) -> Router<AppState> {
    // Admin role only
    let admin_only = Router::new()
        .nest("/legal-pages", legal_pages::admin_router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin));

    // Any signed-in admin or editor
    let protected = Router::new()
        .merge(auth::protected_router())
        .nest("/articles", articles::admin_router())
        .nest("/messages", messages::admin_router())
        .nest("/services", catalog::admin_router(CatalogKind::Service))
        .nest("/steps", catalog::admin_router(CatalogKind::Step))
        .nest("/audiences", catalog::admin_router(CatalogKind::Audience))
        .nest("/global-settings", settings::admin_router())
        .merge(admin_only)
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    Router::new().merge(auth::public_router()).merge(protected)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(e) => tracing::warn!(origin = %cors_origin, error = %e, "Invalid CORS origin, cross-origin requests disabled"),
    }

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/api/public", build_public_router())
        .nest("/api/admin", build_admin_router(state.clone()))
        .route("/uploads/{*path}", get(static_files::serve_upload))
        .fallback(static_files::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
