//! # Catalog Service
//!
//! REST backend for a catalog application: user accounts (signup, login,
//! password recovery with one-time codes), product categories, products and
//! image upload, backed by SQLite.
//!
//! ## Layout
//!
//! - **api**: REST API with Swagger documentation
//! - **auth**: password hashing, JWT issuance/verification, recovery codes,
//!   request gate middleware
//! - **infrastructure**: database pool, entities and migrations
//! - **config**: TOML configuration with environment overrides
//! - **error**: the HTTP error taxonomy shared by all handlers

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod infrastructure;

pub use config::{default_config_path, AppConfig};
pub use error::ApiError;

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig};

// Re-export API router
pub use api::create_api_router;
