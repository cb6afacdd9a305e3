//! API Handlers

pub mod auth;
pub mod categories;
pub mod health;
pub mod products;
pub mod uploads;

pub use auth::*;
pub use categories::*;
pub use health::*;
pub use products::*;
pub use uploads::*;
