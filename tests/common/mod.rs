#![allow(dead_code, unused_imports)]

mod fixtures;
mod request;

pub use fixtures::*;
pub use request::*;

use axum::Router;
use tempfile::TempDir;

use vitrine::api::{build_router, AppState};
use vitrine::cache::MemoryCache;
use vitrine::config::Config;
use vitrine::db::{create_test_pool, migrations, DynDatabasePool};
use std::path::PathBuf;
use std::sync::Arc;

pub const TEST_ORIGIN: &str = "http://localhost:3000";

/// Test context: migrated in-memory database, temp upload dir, full router
///
/// The upload root is a child of a private temp dir, so files "outside" the
/// root can be placed in `workdir` without touching shared locations.
pub struct TestContext {
    pub pool: DynDatabasePool,
    pub state: AppState,
    pub app: Router,
    pub workdir: TempDir,
    pub uploads: PathBuf,
}

impl TestContext {
    pub async fn new() -> Self {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let workdir = tempfile::tempdir().expect("Failed to create temp dir");
        let uploads = workdir.path().join("uploads");
        std::fs::create_dir(&uploads).expect("Failed to create upload dir");
        let mut config = Config::default();
        config.upload.path = uploads.clone();

        let state = AppState::new(pool.clone(), Arc::new(MemoryCache::new()), &config);
        let app = build_router(state.clone(), TEST_ORIGIN);

        Self {
            pool,
            state,
            app,
            workdir,
            uploads,
        }
    }
}
