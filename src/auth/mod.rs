//! Authentication module
//!
//! Provides password hashing, JWT bearer tokens, one-time recovery codes,
//! and the request-gate middleware for protected routes.

pub mod jwt;
pub mod middleware;
pub mod otp;
pub mod password;

pub use jwt::{create_token, verify_token, Claims, JwtConfig};
pub use middleware::{auth_middleware, AuthState, AuthenticatedUser};
pub use otp::{generate_otp, otp_expiry, OTP_TTL_MINUTES};
pub use password::{hash_password, verify_password};
