//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Server-side login session. The token doubles as the primary key and the
/// cookie value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub admin_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// New session with a random v4 UUID token
    pub fn new(admin_id: i64, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            token: uuid::Uuid::new_v4().to_string(),
            admin_id,
            expires_at: now + lifetime,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
