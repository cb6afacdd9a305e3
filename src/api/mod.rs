//! REST API module for the catalog backend
//!
//! HTTP endpoints for accounts, categories, products and image upload.

pub mod dto;
pub mod handlers;
pub mod router;

pub use router::{create_api_router, ApiDoc};
