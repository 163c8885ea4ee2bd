//! Rate-limit counter model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed-window counter row keyed by `(ip, action)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimit {
    pub ip: String,
    pub action: String,
    pub count: i64,
    pub window_start: DateTime<Utc>,
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    /// Over the limit; retry after this many whole minutes (at least 1)
    Limited { retry_after_minutes: i64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed)
    }
}
