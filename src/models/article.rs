//! Article model
//!
//! Articles are soft-deleted: `deleted_at` is set instead of removing the
//! row. Public queries only ever see rows that are neither drafts nor
//! deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::rules::validate_slug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub is_draft: bool,
    pub is_featured: bool,
    pub category: Option<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Ordered by `position`
    pub images: Vec<ArticleImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleImage {
    pub id: i64,
    #[serde(skip_serializing)]
    pub article_id: i64,
    pub url: String,
    pub alt: Option<String>,
    pub position: i32,
}

/// Image entry of an article payload; its index becomes the position
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ArticleImageInput {
    #[validate(length(min = 1, max = 500))]
    #[serde(default)]
    pub url: String,
    #[validate(length(max = 255))]
    pub alt: Option<String>,
}

/// Create/replace payload. An omitted slug is derived from the title on
/// create and left unchanged on update.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ArticleInput {
    #[validate(length(min = 1, max = 255))]
    #[serde(default)]
    pub title: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default = "default_true")]
    pub is_draft: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub publish_date: Option<DateTime<Utc>>,
    #[validate(nested)]
    #[serde(default)]
    pub images: Vec<ArticleImageInput>,
}

fn default_true() -> bool {
    true
}

/// Filters of the public listing
#[derive(Debug, Clone, Default)]
pub struct PublicArticleFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub limit: i64,
}
