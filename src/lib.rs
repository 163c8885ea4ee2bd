//! Vitrine - Content backend for a company showcase site
//!
//! Articles, legal pages, catalog lists, global settings and a rate-limited
//! contact form, served as a JSON API with a session-protected back office.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
