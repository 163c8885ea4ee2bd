//! Data models
//!
//! Database entities, request payloads (with their `validator` rules) and
//! the small value types shared between layers. JSON is camelCase.

mod admin;
mod article;
mod catalog;
mod global_settings;
mod legal_page;
mod message;
mod pagination;
mod rate_limit;
pub mod rules;
mod session;

pub use admin::{Admin, AdminIdentity, AdminRole};
pub use article::{Article, ArticleImage, ArticleImageInput, ArticleInput, PublicArticleFilter};
pub use catalog::{CatalogItem, CatalogItemInput, CatalogKind};
pub use global_settings::{GlobalSettings, GlobalSettingsInput, DEFAULT_SITE_NAME};
pub use legal_page::{LegalPage, LegalPageInput};
pub use message::{ContactInput, Message, MessageFilter, MessageUpdate};
pub use pagination::{ListParams, PagedResult};
pub use rate_limit::{RateLimit, RateLimitDecision};
pub use session::Session;
