//! Authentication API handlers
//!
//! Signup, login and the password-recovery flow. Validation runs in a fixed
//! order (presence, then format/strength, then existence, then match) so the
//! client always sees the same error for the same input. Login failures are
//! deliberately undifferentiated: an unknown email and a wrong password both
//! answer 401 "Invalid credentials".

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidateEmail;

use crate::api::dto::MessageResponse;
use crate::auth::jwt::{create_token, JwtConfig};
use crate::auth::otp::{generate_otp, otp_expiry};
use crate::auth::password::{hash_password, verify_password};
use crate::error::ApiError;
use crate::infrastructure::database::entities::{password_otp, user};

/// State for authentication handlers
#[derive(Clone)]
pub struct AuthHandlerState {
    pub db: sea_orm::DatabaseConnection,
    pub jwt_config: JwtConfig,
}

/// Signup request
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "email": "user@example.com",
    "password": "secret123"
}))]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "email": "user@example.com",
    "password": "secret123"
}))]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Successful login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token. Pass it in the `Authorization: Bearer <token>` header
    pub token: String,
}

/// Forgot-password request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

/// Reset-password request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    /// 6-digit code from the forgot-password step
    pub otp: Option<String>,
    pub new_password: Option<String>,
}

// Fields are Option so a missing field maps to the documented 400 body
// instead of a deserialization rejection. Empty strings count as missing.
fn require(value: Option<&str>) -> Result<&str, ApiError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::validation("Missing fields")),
    }
}

fn check_email_format(email: &str) -> Result<(), ApiError> {
    if email.validate_email() {
        Ok(())
    } else {
        Err(ApiError::validation("Invalid email format"))
    }
}

fn check_password_strength(password: &str) -> Result<(), ApiError> {
    if password.len() >= 6 {
        Ok(())
    } else {
        Err(ApiError::validation("Password too weak (min 6 chars)"))
    }
}

/// Register a new account
///
/// Email uniqueness is case-insensitive: `User@x.com` and `user@x.com` are
/// the same account.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Authentication",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = MessageResponse),
        (status = 400, description = "Missing fields, invalid email format or weak password", body = MessageResponse),
        (status = 409, description = "Email already exists", body = MessageResponse)
    )
)]
pub async fn signup(
    State(state): State<AuthHandlerState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let email = require(request.email.as_deref())?;
    let password = require(request.password.as_deref())?;
    check_email_format(email)?;
    check_password_strength(password)?;

    // Column collation makes this equality check case-insensitive
    let duplicate = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(&state.db)
        .await?;
    if duplicate.is_some() {
        return Err(ApiError::conflict("Email already exists"));
    }

    let password_hash = hash_password(password)?;
    let new_user = user::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    new_user.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Sign up successful")),
    ))
}

/// Log in and obtain a JWT
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated, returns a JWT", body = TokenResponse),
        (status = 400, description = "Missing fields", body = MessageResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse)
    )
)]
pub async fn login(
    State(state): State<AuthHandlerState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = require(request.email.as_deref())?;
    let password = require(request.password.as_deref())?;

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(&state.db)
        .await?;

    // Same answer whether the account is unknown or the password is wrong
    let Some(user) = user else {
        return Err(ApiError::auth("Invalid credentials"));
    };
    let password_valid = verify_password(password, &user.password_hash).unwrap_or(false);
    if !password_valid {
        return Err(ApiError::auth("Invalid credentials"));
    }

    let token = create_token(user.id, &user.email, &state.jwt_config)?;
    Ok(Json(TokenResponse { token }))
}

/// Issue a password-recovery code
///
/// Stores a fresh 6-digit code valid for 10 minutes. Repeated requests issue
/// additional codes; earlier ones stay valid until they expire or a reset
/// succeeds.
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "Authentication",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Recovery code issued", body = MessageResponse),
        (status = 400, description = "Missing fields or invalid email format", body = MessageResponse),
        (status = 404, description = "Account not found", body = MessageResponse)
    )
)]
pub async fn forgot_password(
    State(state): State<AuthHandlerState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = require(request.email.as_deref())?;
    check_email_format(email)?;

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    let otp = generate_otp();
    let code = password_otp::ActiveModel {
        user_id: Set(user.id),
        otp: Set(otp),
        expires_at: Set(otp_expiry()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    code.insert(&state.db).await?;

    // TODO: deliver the code by email once an SMTP relay is available
    tracing::info!(user_id = user.id, "recovery code issued");

    Ok(Json(MessageResponse::new("OTP sent to email")))
}

/// Reset the password with a recovery code
///
/// On success the password hash is replaced and every outstanding code for
/// the account is consumed, in one transaction. A consumed or expired code
/// answers 400.
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "Authentication",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced, all codes consumed", body = MessageResponse),
        (status = 400, description = "Missing fields, weak password or invalid/expired code", body = MessageResponse),
        (status = 404, description = "Account not found", body = MessageResponse)
    )
)]
pub async fn reset_password(
    State(state): State<AuthHandlerState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = require(request.email.as_deref())?;
    let otp = require(request.otp.as_deref())?;
    let new_password = require(request.new_password.as_deref())?;
    check_email_format(email)?;
    check_password_strength(new_password)?;

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    // Several codes may be outstanding; pick the latest-expiring match
    let code = password_otp::Entity::find()
        .filter(password_otp::Column::UserId.eq(user.id))
        .filter(password_otp::Column::Otp.eq(otp))
        .filter(password_otp::Column::ExpiresAt.gt(Utc::now()))
        .order_by_desc(password_otp::Column::ExpiresAt)
        .one(&state.db)
        .await?;
    if code.is_none() {
        return Err(ApiError::validation("Invalid or expired OTP"));
    }

    let password_hash = hash_password(new_password)?;
    let user_id = user.id;
    state
        .db
        .transaction::<_, (), DbErr>(move |txn| {
            Box::pin(async move {
                let mut account: user::ActiveModel = user.into();
                account.password_hash = Set(password_hash);
                account.update(txn).await?;

                password_otp::Entity::delete_many()
                    .filter(password_otp::Column::UserId.eq(user_id))
                    .exec(txn)
                    .await?;
                Ok(())
            })
        })
        .await?;

    Ok(Json(MessageResponse::new("Password reset successful")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::migrator::Migrator;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use sea_orm::{ConnectOptions, Database, DatabaseConnection};
    use sea_orm_migration::MigratorTrait;
    use tower::ServiceExt;

    async fn test_db() -> DatabaseConnection {
        // Single connection so every query sees the same in-memory database
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).min_connections(1);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "auth-test-secret".to_string(),
            expiration_hours: 24,
            issuer: "catalog-service".to_string(),
        }
    }

    fn app(db: DatabaseConnection) -> Router {
        let state = AuthHandlerState {
            db,
            jwt_config: jwt_config(),
        };
        Router::new()
            .route("/api/auth/signup", post(signup))
            .route("/api/auth/login", post(login))
            .route("/api/auth/forgot-password", post(forgot_password))
            .route("/api/auth/reset-password", post(reset_password))
            .with_state(state)
    }

    async fn post_json(
        app: &Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn signup_user(app: &Router, email: &str, password: &str) {
        let (status, _) = post_json(
            app,
            "/api/auth/signup",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn signup_then_login_roundtrip() {
        let app = app(test_db().await);
        signup_user(&app, "round@trip.com", "secret1").await;

        let (status, body) = post_json(
            &app,
            "/api/auth/login",
            serde_json::json!({ "email": "round@trip.com", "password": "secret1" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    }

    #[tokio::test]
    async fn signup_validation_order_and_messages() {
        let app = app(test_db().await);

        let (status, body) = post_json(
            &app,
            "/api/auth/signup",
            serde_json::json!({ "email": "a@b.com" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing fields");

        let (status, body) = post_json(
            &app,
            "/api/auth/signup",
            serde_json::json!({ "email": "not-an-email", "password": "secret1" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid email format");

        let (status, body) = post_json(
            &app,
            "/api/auth/signup",
            serde_json::json!({ "email": "a@b.com", "password": "short" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Password too weak (min 6 chars)");
    }

    #[tokio::test]
    async fn duplicate_signup_is_case_insensitive() {
        let app = app(test_db().await);
        signup_user(&app, "dup@example.com", "secret1").await;

        let (status, body) = post_json(
            &app,
            "/api/auth/signup",
            serde_json::json!({ "email": "DUP@Example.COM", "password": "secret2" }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Email already exists");
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let app = app(test_db().await);
        signup_user(&app, "known@example.com", "secret1").await;

        let (wrong_pw_status, wrong_pw_body) = post_json(
            &app,
            "/api/auth/login",
            serde_json::json!({ "email": "known@example.com", "password": "wrong-pw" }),
        )
        .await;
        let (unknown_status, unknown_body) = post_json(
            &app,
            "/api/auth/login",
            serde_json::json!({ "email": "nobody@example.com", "password": "secret1" }),
        )
        .await;

        assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_pw_status, unknown_status);
        assert_eq!(wrong_pw_body, unknown_body);
        assert_eq!(wrong_pw_body["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn forgot_password_issues_codes_that_accumulate() {
        let db = test_db().await;
        let app = app(db.clone());
        signup_user(&app, "forgot@example.com", "secret1").await;

        for _ in 0..2 {
            let (status, body) = post_json(
                &app,
                "/api/auth/forgot-password",
                serde_json::json!({ "email": "forgot@example.com" }),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["message"], "OTP sent to email");
        }

        let codes = password_otp::Entity::find().all(&db).await.unwrap();
        assert_eq!(codes.len(), 2);
        for code in &codes {
            assert_eq!(code.otp.len(), 6);
            assert!(code.otp.chars().all(|c| c.is_ascii_digit()));
            assert!(code.expires_at > Utc::now());
        }
    }

    #[tokio::test]
    async fn forgot_password_for_unknown_account() {
        let app = app(test_db().await);
        let (status, body) = post_json(
            &app,
            "/api/auth/forgot-password",
            serde_json::json!({ "email": "ghost@example.com" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Account not found");
    }

    async fn stored_hash(db: &DatabaseConnection, email: &str) -> String {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(db)
            .await
            .unwrap()
            .unwrap()
            .password_hash
    }

    #[tokio::test]
    async fn expired_code_is_rejected_and_hash_unchanged() {
        let db = test_db().await;
        let app = app(db.clone());
        signup_user(&app, "expired@example.com", "secret1").await;
        let hash_before = stored_hash(&db, "expired@example.com").await;

        let user = user::Entity::find().one(&db).await.unwrap().unwrap();
        let stale = password_otp::ActiveModel {
            user_id: Set(user.id),
            otp: Set("123456".to_string()),
            expires_at: Set(Utc::now() - chrono::Duration::minutes(1)),
            created_at: Set(Utc::now() - chrono::Duration::minutes(11)),
            ..Default::default()
        };
        stale.insert(&db).await.unwrap();

        let (status, body) = post_json(
            &app,
            "/api/auth/reset-password",
            serde_json::json!({
                "email": "expired@example.com",
                "otp": "123456",
                "new_password": "another1"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid or expired OTP");
        assert_eq!(stored_hash(&db, "expired@example.com").await, hash_before);
    }

    #[tokio::test]
    async fn valid_reset_rotates_hash_and_consumes_all_codes() {
        let db = test_db().await;
        let app = app(db.clone());
        signup_user(&app, "reset@example.com", "secret1").await;
        let hash_before = stored_hash(&db, "reset@example.com").await;

        // Two outstanding codes; resetting with one consumes both
        for _ in 0..2 {
            post_json(
                &app,
                "/api/auth/forgot-password",
                serde_json::json!({ "email": "reset@example.com" }),
            )
            .await;
        }
        let code = password_otp::Entity::find()
            .one(&db)
            .await
            .unwrap()
            .unwrap()
            .otp;

        let reset_body = serde_json::json!({
            "email": "reset@example.com",
            "otp": code,
            "new_password": "fresh-password"
        });
        let (status, body) = post_json(&app, "/api/auth/reset-password", reset_body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password reset successful");
        assert_ne!(stored_hash(&db, "reset@example.com").await, hash_before);
        assert!(password_otp::Entity::find()
            .all(&db)
            .await
            .unwrap()
            .is_empty());

        // Replay with the same code fails
        let (status, body) = post_json(&app, "/api/auth/reset-password", reset_body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid or expired OTP");

        // And the new password logs in
        let (status, _) = post_json(
            &app,
            "/api/auth/login",
            serde_json::json!({ "email": "reset@example.com", "password": "fresh-password" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
