//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories. They own
//! the rules that are not plain persistence: slug generation, duplicate
//! checks, rate limiting, session validity and cache invalidation.

pub mod article;
pub mod auth;
pub mod catalog;
pub mod legal_page;
pub mod message;
pub mod password;
pub mod rate_limiter;
pub mod settings;

pub use article::{generate_slug, ArticleService, ArticleServiceError};
pub use auth::{AuthError, AuthService};
pub use catalog::{CatalogService, CatalogServiceError};
pub use legal_page::{LegalPageService, LegalPageServiceError};
pub use message::{MessageService, MessageServiceError};
pub use password::{hash_password, verify_password};
pub use rate_limiter::{RateLimiter, CONTACT_ACTION, LOGIN_ACTION};
pub use settings::{SettingsService, SettingsServiceError};
