//! Admin authentication
//!
//! Login issues a database-backed session whose token becomes the
//! `admin_session` cookie. A session is honoured only while it is unexpired
//! and its admin is still active; expired rows are removed when seen.

use crate::db::repositories::{AdminRepository, SessionRepository};
use crate::models::{Admin, AdminIdentity, AdminRole, RateLimitDecision, Session};
use crate::services::password::{hash_password, verify_password};
use crate::services::rate_limiter::{RateLimiter, LOGIN_ACTION};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email, wrong password and inactive account look the same
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Too many login attempts")]
    RateLimited { retry_after_minutes: i64 },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct AuthService {
    admins: Arc<dyn AdminRepository>,
    sessions: Arc<dyn SessionRepository>,
    rate_limiter: Arc<RateLimiter>,
    session_lifetime: Duration,
    login_max: i64,
}

impl AuthService {
    pub fn new(
        admins: Arc<dyn AdminRepository>,
        sessions: Arc<dyn SessionRepository>,
        rate_limiter: Arc<RateLimiter>,
        session_lifetime: Duration,
        login_max: i64,
    ) -> Self {
        Self {
            admins,
            sessions,
            rate_limiter,
            session_lifetime,
            login_max,
        }
    }

    pub fn session_lifetime(&self) -> Duration {
        self.session_lifetime
    }

    /// Verify credentials for a request coming from `ip` and open a session.
    ///
    /// Every failed attempt counts against the `login` limit of that IP.
    pub async fn login(&self, ip: &str, email: &str, password: &str) -> Result<(Session, Admin), AuthError> {
        if let RateLimitDecision::Limited { retry_after_minutes } =
            self.rate_limiter.check(ip, LOGIN_ACTION, self.login_max).await?
        {
            return Err(AuthError::RateLimited { retry_after_minutes });
        }

        let admin = match self.admins.get_by_email(email).await? {
            Some(admin) if admin.is_active && verify_password(password, &admin.password_hash)? => admin,
            _ => {
                self.rate_limiter.increment(ip, LOGIN_ACTION).await?;
                tracing::warn!(ip, "Failed admin login attempt");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let session = self
            .sessions
            .create(&Session::new(admin.id, self.session_lifetime))
            .await
            .context("Failed to create session")?;
        self.admins
            .update_last_login(admin.id, session.created_at)
            .await
            .context("Failed to record last login")?;

        tracing::info!(admin_id = admin.id, "Admin logged in");
        Ok((session, admin))
    }

    /// Delete the session behind `token`. Returns whether a row existed.
    pub async fn logout(&self, token: &str) -> Result<bool, AuthError> {
        let deleted = self
            .sessions
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(deleted)
    }

    /// Resolve a session token to the identity it stands for
    pub async fn validate_session(&self, token: &str) -> Result<Option<AdminIdentity>, AuthError> {
        let Some(session) = self
            .sessions
            .get_by_token(token)
            .await
            .context("Failed to get session")?
        else {
            return Ok(None);
        };

        if session.is_expired() {
            self.sessions
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let admin = self
            .admins
            .get_by_id(session.admin_id)
            .await
            .context("Failed to get admin")?;

        match admin {
            Some(admin) if admin.is_active => Ok(Some(admin.identity())),
            _ => {
                // Deactivated or removed accounts lose every session at once
                let revoked = self
                    .sessions
                    .delete_by_admin(session.admin_id)
                    .await
                    .context("Failed to revoke sessions")?;
                tracing::info!(admin_id = session.admin_id, revoked, "Revoked sessions of inactive admin");
                Ok(None)
            }
        }
    }

    /// Create the first admin account when none exists yet
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<Option<Admin>, AuthError> {
        if self.admins.count().await? > 0 {
            return Ok(None);
        }

        let hash = hash_password(password)?;
        let admin = self
            .admins
            .create(&Admin::new(email.to_string(), hash, AdminRole::Admin))
            .await
            .context("Failed to create bootstrap admin")?;

        tracing::info!(email = %admin.email, "Created bootstrap admin account");
        Ok(Some(admin))
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AuthError> {
        let count = self
            .sessions
            .delete_expired(Utc::now())
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }
}
