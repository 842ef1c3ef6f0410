//! Biblio server
//!
//! REST JSON API for a library lending catalog: books, authors, categories,
//! members, loans and reviews, with role and ownership based access control
//! and a Redis read-through cache on the hot endpoints.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod permissions;
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
