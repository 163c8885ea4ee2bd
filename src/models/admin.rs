//! Admin account model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Back-office account allowed to sign in to the admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: i64,
    pub email: String,
    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: AdminRole,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    /// Build a new, active account. The id is assigned by the database.
    pub fn new(email: String, password_hash: String, role: AdminRole) -> Self {
        Self {
            id: 0,
            email,
            password_hash,
            role,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
        }
    }

    /// Identity exposed to handlers once a session has been validated
    pub fn identity(&self) -> AdminIdentity {
        AdminIdentity {
            admin_id: self.id,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Account role.
///
/// Editors manage content; only admins may change legal pages and the
/// site-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    Admin,
    #[default]
    Editor,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::Admin => "admin",
            AdminRole::Editor => "editor",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(AdminRole::Admin),
            "editor" => Ok(AdminRole::Editor),
            _ => Err(anyhow::anyhow!("Invalid admin role: {}", s)),
        }
    }
}

/// Result of a successful session check: `{adminId, email, role}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminIdentity {
    pub admin_id: i64,
    pub email: String,
    pub role: AdminRole,
}
