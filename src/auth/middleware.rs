//! Authentication middleware for Axum
//!
//! The request gate for protected routes. Validates the `Authorization:
//! Bearer <token>` header and attaches the decoded identity to the request
//! extensions. All failure paths return 401; handlers never run on failure.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::jwt::{verify_token, JwtConfig};

/// Authentication state for the request gate
#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

/// Authenticated identity attached to the request after a successful gate pass.
///
/// Read-only for downstream handlers; there is no role or permission model.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub email: String,
}

/// JWT authentication middleware - requires a valid bearer token
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let Some(auth_header) = auth_header else {
        return unauthorized("Missing Authorization header");
    };

    // Exactly two space-separated parts, the first being literal "Bearer"
    let parts: Vec<&str> = auth_header.split(' ').collect();
    if parts.len() != 2 || parts[0] != "Bearer" {
        return unauthorized("Invalid Authorization format");
    }

    // Any verification failure (bad signature, malformed, expired) is reported
    // identically to the client.
    match verify_token(parts[1], &auth_state.jwt_config) {
        Ok(claims) => {
            let Ok(user_id) = claims.sub.parse::<i32>() else {
                return unauthorized("Invalid or expired token");
            };
            request.extensions_mut().insert(AuthenticatedUser {
                user_id,
                email: claims.email,
            });
            next.run(request).await
        }
        Err(_) => unauthorized("Invalid or expired token"),
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response()
}
