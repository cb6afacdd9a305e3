//! API Router with Swagger UI

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::dto::{ListResponse, MessageResponse, PagedResponse, Paging};
use crate::api::handlers::{auth, categories, health, products, uploads};
use crate::auth::jwt::JwtConfig;
use crate::auth::middleware::{auth_middleware, AuthState};
use crate::config::UploadConfig;

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::signup,
        auth::login,
        auth::forgot_password,
        auth::reset_password,
        // Categories
        categories::list_categories,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        // Products
        products::list_products,
        products::create_product,
        products::update_product,
        products::delete_product,
        // Upload
        uploads::upload_image,
    ),
    components(
        schemas(
            // Common
            MessageResponse,
            Paging,
            ListResponse<categories::CategoryDto>,
            PagedResponse<products::ProductDto>,
            // Auth
            auth::SignupRequest,
            auth::LoginRequest,
            auth::TokenResponse,
            auth::ForgotPasswordRequest,
            auth::ResetPasswordRequest,
            // Categories
            categories::CategoryDto,
            categories::CreateCategoryRequest,
            categories::UpdateCategoryRequest,
            // Products
            products::ProductDto,
            products::CreateProductRequest,
            products::UpdateProductRequest,
            // Upload
            uploads::UploadResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness probe for uptime monitoring."),
        (name = "Authentication", description = "Signup, login and password recovery. Login returns a JWT in the `token` field; pass it as `Authorization: Bearer <token>`."),
        (name = "Categories", description = "Product categories. Listing is public; creating, renaming and deleting require a bearer token. Names are unique case-insensitively."),
        (name = "Products", description = "Product catalog with pagination, name search, category filter and whitelisted sorting (`name`/`price`, `asc`/`desc`). Listing is public; writes require a bearer token."),
        (name = "Upload", description = "Image upload (multipart field `image`, max 5 MB). Stored files are served under `/images/{filename}`."),
    ),
    info(
        title = "Catalog Service API",
        version = "1.0.0",
        description = "REST backend for a catalog application: accounts with password recovery, categories, products and image upload.

## Authentication

Obtain a JWT via `POST /api/auth/login` and pass it in the `Authorization: Bearer <token>` header. Read endpoints (category and product listings, `/images`, `/health`) are public.

## Response format

Write operations answer `{\"message\": \"...\"}`. Unpaginated lists answer `{\"data\": [...]}`; paginated lists answer `{\"paging\": {...}, \"data\": [...]}`.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(
    db: DatabaseConnection,
    jwt_config: JwtConfig,
    uploads_config: &UploadConfig,
) -> Router {
    let middleware_state = AuthState { jwt_config: jwt_config.clone() };

    let auth_state = auth::AuthHandlerState {
        db: db.clone(),
        jwt_config,
    };
    let category_state = categories::CategoryHandlerState { db: db.clone() };
    let product_state = products::ProductHandlerState { db };
    let upload_state = uploads::UploadState {
        dir: uploads_config.dir.clone(),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .with_state(auth_state);

    // Category routes: public listing, protected writes
    let category_public_routes = Router::new()
        .route("/", get(categories::list_categories))
        .with_state(category_state.clone());
    let category_protected_routes = Router::new()
        .route("/", post(categories::create_category))
        .route(
            "/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(category_state);

    // Product routes: public listing, protected writes
    let product_public_routes = Router::new()
        .route("/", get(products::list_products))
        .with_state(product_state.clone());
    let product_protected_routes = Router::new()
        .route("/", post(products::create_product))
        .route(
            "/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(product_state);

    // Upload routes (protected, body capped at the configured size)
    let upload_routes = Router::new()
        .route("/", post(uploads::upload_image))
        .layer(DefaultBodyLimit::max(uploads_config.max_size_bytes()))
        .layer(middleware::from_fn_with_state(
            middleware_state,
            auth_middleware,
        ))
        .with_state(upload_state);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    // Build router
    Router::new()
        // Swagger UI
        .merge(swagger_routes)
        // Health
        .route("/health", get(health::health_check))
        // Auth
        .nest("/api/auth", auth_routes)
        // Categories
        .nest("/api/categories", category_public_routes)
        .nest("/api/categories", category_protected_routes)
        // Products
        .nest("/api/products", product_public_routes)
        .nest("/api/products", product_protected_routes)
        // Upload
        .nest("/api/upload", upload_routes)
        // Uploaded images (static)
        .nest_service("/images", ServeDir::new(&uploads_config.dir))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::create_token;
    use crate::infrastructure::database::migrator::Migrator;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sea_orm::{ConnectOptions, Database};
    use sea_orm_migration::MigratorTrait;
    use tower::ServiceExt;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "router-test-secret".to_string(),
            expiration_hours: 24,
            issuer: "catalog-service".to_string(),
        }
    }

    async fn test_router() -> Router {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).min_connections(1);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let uploads = UploadConfig::default();
        create_api_router(db, jwt_config(), &uploads)
    }

    fn json_request(method: &str, uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = auth {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = test_router().await;
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn category_listing_is_public_but_writes_are_gated() {
        let app = test_router().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/categories")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/categories",
                None,
                serde_json::json!({ "name": "Drinks" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bearer_gated_category_create_end_to_end() {
        let app = test_router().await;

        let token = create_token(1, "admin@example.com", &jwt_config()).unwrap();
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/categories",
                Some(&token),
                serde_json::json!({ "name": "Drinks" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/categories",
                Some("not-a-real-token"),
                serde_json::json!({ "name": "Snacks" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn product_writes_are_gated() {
        let app = test_router().await;
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/products",
                None,
                serde_json::json!({ "name": "Juice", "category_id": 1, "price": 1.0 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
