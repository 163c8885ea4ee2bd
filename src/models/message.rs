//! Contact message model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Message submitted through the public contact form
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

/// Contact form payload
///
/// Every field is trimmed while it is read, so the rules below see what gets
/// stored. Blank optional fields come out as `None`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    #[validate(length(min = 1, max = 100))]
    #[serde(default, deserialize_with = "trimmed")]
    pub name: String,
    #[validate(email)]
    #[serde(default, deserialize_with = "trimmed")]
    pub email: String,
    #[validate(length(max = 40))]
    #[serde(default, deserialize_with = "trimmed_non_blank")]
    pub phone: Option<String>,
    #[validate(length(max = 120))]
    #[serde(default, deserialize_with = "trimmed_non_blank")]
    pub company: Option<String>,
    #[validate(length(max = 200))]
    #[serde(default, deserialize_with = "trimmed_non_blank")]
    pub subject: Option<String>,
    #[validate(length(min = 10, max = 5000))]
    #[serde(default, deserialize_with = "trimmed")]
    pub message: String,
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

fn trimmed_non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// Admin inbox update (`PATCH`); absent flags are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MessageUpdate {
    pub is_read: Option<bool>,
    pub is_archived: Option<bool>,
}

impl MessageUpdate {
    pub fn has_changes(&self) -> bool {
        self.is_read.is_some() || self.is_archived.is_some()
    }
}

/// Inbox filter
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageFilter {
    pub archived: bool,
    pub unread_only: bool,
}
