//! Common API utilities and shared types
//!
//! Pagination defaults for the admin list queries (`?page=&perPage=`).
//! Values are clamped by [`crate::models::ListParams::new`].

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size for admin lists
pub fn default_per_page() -> u32 {
    20
}
