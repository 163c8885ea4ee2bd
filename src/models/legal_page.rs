//! Legal page model (imprint, privacy policy, terms)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::rules::{validate_rich_content, validate_slug};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalPage {
    pub id: i64,
    pub slug: String,
    pub title: String,
    /// Either an HTML string or a rich-text block structure, stored as JSON
    pub content: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/replace payload.
///
/// Missing fields deserialize to empty values so that they surface as
/// validation issues rather than a body parse failure.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LegalPageInput {
    #[validate(custom(function = "validate_slug"))]
    #[serde(default)]
    pub slug: String,
    #[validate(length(min = 1, max = 200))]
    #[serde(default)]
    pub title: String,
    #[validate(custom(function = "validate_rich_content"))]
    #[serde(default)]
    pub content: Value,
}
