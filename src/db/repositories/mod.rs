//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles persistence for a single entity on both backends.

pub mod admin;
pub mod article;
pub mod catalog;
pub mod global_settings;
pub mod legal_page;
pub mod message;
pub mod rate_limit;
pub mod session;

pub use admin::{AdminRepository, SqlxAdminRepository};
pub use article::{ArticleRepository, SqlxArticleRepository};
pub use catalog::{CatalogRepository, SqlxCatalogRepository};
pub use global_settings::{GlobalSettingsRepository, SqlxGlobalSettingsRepository};
pub use legal_page::{LegalPageRepository, SqlxLegalPageRepository};
pub use message::{MessageRepository, SqlxMessageRepository};
pub use rate_limit::{RateLimitRepository, SqlxRateLimitRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
