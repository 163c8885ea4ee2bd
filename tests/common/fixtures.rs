#![allow(dead_code, unused_imports)]

use chrono::Duration;

use vitrine::db::repositories::{
    AdminRepository, SessionRepository, SqlxAdminRepository, SqlxSessionRepository,
};
use vitrine::db::DynDatabasePool;
use vitrine::models::{Admin, AdminRole, Session};
use vitrine::services::hash_password;

pub const TEST_PASSWORD: &str = "correct horse battery";

/// Creates an active account with [`TEST_PASSWORD`]
pub async fn create_test_admin(pool: &DynDatabasePool, email: &str, role: AdminRole) -> Admin {
    let hash = hash_password(TEST_PASSWORD).expect("Failed to hash password");
    SqlxAdminRepository::new(pool.clone())
        .create(&Admin::new(email.to_string(), hash, role))
        .await
        .expect("Failed to create admin")
}

/// Creates a session expiring after `lifetime` (negative for an expired one),
/// returns its token
pub async fn create_test_session(pool: &DynDatabasePool, admin_id: i64, lifetime: Duration) -> String {
    let session = Session::new(admin_id, lifetime);
    SqlxSessionRepository::new(pool.clone())
        .create(&session)
        .await
        .expect("Failed to create session");
    session.token
}

/// Admin account plus a live session token
pub async fn signed_in(pool: &DynDatabasePool, email: &str, role: AdminRole) -> (Admin, String) {
    let admin = create_test_admin(pool, email, role).await;
    let token = create_test_session(pool, admin.id, Duration::days(7)).await;
    (admin, token)
}

pub async fn session_exists(pool: &DynDatabasePool, token: &str) -> bool {
    SqlxSessionRepository::new(pool.clone())
        .get_by_token(token)
        .await
        .expect("Failed to read session")
        .is_some()
}
