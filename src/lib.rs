//! Bookshelf server
//!
//! A REST JSON API for a catalog of books and their authors: filtered and
//! paginated listing, random recommendations, bulk JSON/CSV import and
//! export, and JWT-protected writes.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
