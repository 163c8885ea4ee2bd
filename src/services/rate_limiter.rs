//! Per-IP fixed-window rate limiter
//!
//! Counters live in the `rate_limits` table keyed by `(ip, action)`, so
//! limits hold across restarts and across instances sharing a database.
//! A window is over once a full window length has passed since it began;
//! from that instant on the counter counts as empty.

use crate::db::repositories::RateLimitRepository;
use crate::models::RateLimitDecision;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Action name of the public contact form
pub const CONTACT_ACTION: &str = "contact";

/// Action name of admin login attempts
pub const LOGIN_ACTION: &str = "login";

pub struct RateLimiter {
    repo: Arc<dyn RateLimitRepository>,
    window: Duration,
}

impl RateLimiter {
    pub fn new(repo: Arc<dyn RateLimitRepository>, window: Duration) -> Self {
        Self { repo, window }
    }

    /// Whether `ip` may perform `action` once more
    pub async fn check(&self, ip: &str, action: &str, max_requests: i64) -> Result<RateLimitDecision> {
        self.check_at(ip, action, max_requests, Utc::now()).await
    }

    pub async fn check_at(
        &self,
        ip: &str,
        action: &str,
        max_requests: i64,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision> {
        let Some(counter) = self
            .repo
            .get(ip, action)
            .await
            .context("Failed to read rate limit")?
        else {
            return Ok(RateLimitDecision::Allowed);
        };

        let window_end = counter.window_start + self.window;
        if window_end <= now || counter.count < max_requests {
            return Ok(RateLimitDecision::Allowed);
        }

        Ok(RateLimitDecision::Limited {
            retry_after_minutes: minutes_until(now, window_end),
        })
    }

    /// Record one use of `action` by `ip`
    pub async fn increment(&self, ip: &str, action: &str) -> Result<()> {
        self.increment_at(ip, action, Utc::now()).await
    }

    pub async fn increment_at(&self, ip: &str, action: &str, now: DateTime<Utc>) -> Result<()> {
        self.repo
            .increment(ip, action, now, now - self.window)
            .await
            .context("Failed to increment rate limit")
    }

    /// Drop counters whose window has fully elapsed
    pub async fn cleanup(&self) -> Result<u64> {
        self.repo
            .delete_stale(Utc::now() - self.window)
            .await
            .context("Failed to clean up rate limits")
    }
}

/// Whole minutes until `end`, rounded up, at least 1
fn minutes_until(now: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let seconds = (end - now).num_seconds().max(0);
    ((seconds + 59) / 60).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxRateLimitRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_limiter() -> RateLimiter {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        RateLimiter::new(SqlxRateLimitRepository::boxed(pool), Duration::minutes(15))
    }

    #[test]
    fn test_minutes_until_rounds_up() {
        let now = Utc::now();
        assert_eq!(minutes_until(now, now + Duration::seconds(1)), 1);
        assert_eq!(minutes_until(now, now + Duration::seconds(60)), 1);
        assert_eq!(minutes_until(now, now + Duration::seconds(61)), 2);
        assert_eq!(minutes_until(now, now + Duration::minutes(15)), 15);
        assert_eq!(minutes_until(now, now - Duration::seconds(5)), 1);
    }

    #[tokio::test]
    async fn test_sixth_request_is_limited() {
        let limiter = setup_limiter().await;
        let ip = "203.0.113.7";

        for _ in 0..5 {
            let decision = limiter.check(ip, CONTACT_ACTION, 5).await.unwrap();
            assert!(decision.is_allowed());
            limiter.increment(ip, CONTACT_ACTION).await.unwrap();
        }

        match limiter.check(ip, CONTACT_ACTION, 5).await.unwrap() {
            RateLimitDecision::Limited { retry_after_minutes } => {
                assert!((1..=15).contains(&retry_after_minutes));
            }
            RateLimitDecision::Allowed => panic!("6th request should be limited"),
        }

        // Other IPs and other actions are unaffected
        assert!(limiter.check("198.51.100.1", CONTACT_ACTION, 5).await.unwrap().is_allowed());
        assert!(limiter.check(ip, LOGIN_ACTION, 5).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_window_resets_after_it_elapses() {
        let limiter = setup_limiter().await;
        let ip = "203.0.113.8";
        let start = Utc::now() - Duration::minutes(20);

        for _ in 0..5 {
            limiter.increment_at(ip, LOGIN_ACTION, start).await.unwrap();
        }
        assert!(!limiter
            .check_at(ip, LOGIN_ACTION, 5, start + Duration::minutes(1))
            .await
            .unwrap()
            .is_allowed());

        // Twenty minutes later the old window is over
        assert!(limiter.check(ip, LOGIN_ACTION, 5).await.unwrap().is_allowed());

        limiter.increment(ip, LOGIN_ACTION).await.unwrap();
        let counter = limiter.repo.get(ip, LOGIN_ACTION).await.unwrap().unwrap();
        assert_eq!(counter.count, 1);
    }

    #[tokio::test]
    async fn test_hit_at_window_end_starts_a_new_window() {
        let limiter = setup_limiter().await;
        let ip = "203.0.113.9";
        let start = Utc::now() - Duration::minutes(20);
        let boundary = start + Duration::minutes(15);

        for _ in 0..5 {
            limiter.increment_at(ip, CONTACT_ACTION, start).await.unwrap();
        }
        assert!(limiter
            .check_at(ip, CONTACT_ACTION, 5, boundary)
            .await
            .unwrap()
            .is_allowed());

        limiter.increment_at(ip, CONTACT_ACTION, boundary).await.unwrap();
        let counter = limiter.repo.get(ip, CONTACT_ACTION).await.unwrap().unwrap();
        assert_eq!(counter.count, 1);
        assert!((counter.window_start - boundary).num_milliseconds().abs() < 1);

        assert!(!limiter
            .check_at(ip, CONTACT_ACTION, 1, boundary)
            .await
            .unwrap()
            .is_allowed());
    }

    #[tokio::test]
    async fn test_cleanup_removes_stale_counters() {
        let limiter = setup_limiter().await;
        limiter
            .increment_at("old", CONTACT_ACTION, Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        limiter.increment("fresh", CONTACT_ACTION).await.unwrap();

        assert_eq!(limiter.cleanup().await.unwrap(), 1);
        assert!(limiter.repo.get("old", CONTACT_ACTION).await.unwrap().is_none());
        assert!(limiter.repo.get("fresh", CONTACT_ACTION).await.unwrap().is_some());
    }
}
