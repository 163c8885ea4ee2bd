//! Vitrine - Content backend for a company showcase site

use anyhow::Result;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vitrine::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db,
};

/// How often expired sessions and stale rate-limit rows are purged
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitrine=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Vitrine...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!(applied, "Database migrations completed");

    let cache = create_cache(&config.cache);
    let state = AppState::new(pool.clone(), cache, &config);

    if let (Some(email), Some(password)) = (&config.auth.bootstrap_email, &config.auth.bootstrap_password) {
        if let Some(admin) = state.auth_service.bootstrap_admin(email, password).await? {
            tracing::info!(email = %admin.email, "Bootstrap admin created");
        }
    }

    // Purge expired sessions and stale rate-limit windows (every 5 minutes)
    {
        let auth_service = state.auth_service.clone();
        let rate_limiter = state.rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                match auth_service.cleanup_expired_sessions().await {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!(removed = n, "Expired sessions removed"),
                    Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
                }
                if let Err(e) = rate_limiter.cleanup().await {
                    tracing::warn!(error = %e, "Rate limit cleanup failed");
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    pool.close().await;
    Ok(())
}
