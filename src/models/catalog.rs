//! Catalog items: services, process steps and target audiences
//!
//! The three lists share one shape and differ only by table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    Service,
    Step,
    Audience,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 3] = [CatalogKind::Service, CatalogKind::Step, CatalogKind::Audience];

    pub fn table(&self) -> &'static str {
        match self {
            CatalogKind::Service => "services",
            CatalogKind::Step => "steps",
            CatalogKind::Audience => "audiences",
        }
    }

    /// Human name used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            CatalogKind::Service => "Service",
            CatalogKind::Step => "Step",
            CatalogKind::Audience => "Audience",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub icon: Option<String>,
    pub order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemInput {
    #[validate(length(min = 1, max = 200))]
    #[serde(default)]
    pub title: String,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(max = 100))]
    pub icon: Option<String>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
