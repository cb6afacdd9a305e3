//! Product API handlers
//!
//! Listing is public and paginated; writes sit behind the bearer gate.
//! Updates are partial: only the fields present in the body change, and
//! `updated_at` always advances.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::dto::{MessageResponse, PagedResponse};
use crate::error::ApiError;
use crate::infrastructure::database::entities::{category, product};

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_LIMIT: u64 = 20;

/// State for product handlers
#[derive(Clone)]
pub struct ProductHandlerState {
    pub db: sea_orm::DatabaseConnection,
}

/// Product as returned by the API, joined with its category name
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category_id: i32,
    pub category_name: String,
}

impl ProductDto {
    fn from_joined(model: product::Model, category: Option<category::Model>) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            image_url: model.image_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
            category_id: model.category_id,
            category_name: category.map(|c| c.name).unwrap_or_default(),
        }
    }
}

/// Create-product request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
}

/// Update-product request
///
/// Absent fields are left untouched. For `description` and `image_url` an
/// explicit `null` clears the value, which is why those two are
/// double-wrapped.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub category_id: Option<i32>,
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
}

// Present-but-null deserializes to Some(None); an absent field stays None
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Query parameters for product listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListParams {
    /// Page number (1-based), default 1
    pub page: Option<u64>,
    /// Page size, default 20
    pub limit: Option<u64>,
    /// Substring filter on the name (case-insensitive)
    pub search: Option<String>,
    /// Restrict to one category
    pub category_id: Option<i32>,
    /// Sort column, `name` (default) or `price`
    pub sort_by: Option<String>,
    /// Sort direction, `asc` (default) or `desc`
    pub order: Option<String>,
}

fn require_name(name: Option<&str>) -> Result<&str, ApiError> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(ApiError::validation("Missing product name")),
    }
}

fn check_price(price: Option<f64>) -> Result<f64, ApiError> {
    match price {
        Some(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(ApiError::validation("Invalid price")),
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

async fn ensure_category_exists(
    db: &sea_orm::DatabaseConnection,
    category_id: i32,
) -> Result<(), ApiError> {
    category::Entity::find_by_id(category_id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("Category not found"))
}

/// List products
///
/// Paginated, with optional name search, category filter and whitelisted
/// sorting (`name` or `price`, `asc` or `desc`). Every row carries its
/// category name.
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(ProductListParams),
    responses(
        (status = 200, description = "One page of products", body = PagedResponse<ProductDto>)
    )
)]
pub async fn list_products(
    State(state): State<ProductHandlerState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<PagedResponse<ProductDto>>, ApiError> {
    let page = params.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
    let limit = params.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT);

    let mut query = product::Entity::find().find_also_related(category::Entity);
    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(product::Column::Name.contains(search));
    }
    if let Some(category_id) = params.category_id {
        query = query.filter(product::Column::CategoryId.eq(category_id));
    }

    // Sort column and direction are whitelisted, everything else falls back
    let sort_column = match params.sort_by.as_deref() {
        Some("price") => product::Column::Price,
        _ => product::Column::Name,
    };
    let direction = match params.order.as_deref() {
        Some(order) if order.eq_ignore_ascii_case("desc") => Order::Desc,
        _ => Order::Asc,
    };
    let query = query.order_by(sort_column, direction);

    let paginator = query.paginate(&state.db, limit);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page - 1).await?;

    let data = rows
        .into_iter()
        .map(|(model, category)| ProductDto::from_joined(model, category))
        .collect();
    Ok(Json(PagedResponse::new(data, total, page, limit)))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    security(("bearer_auth" = [])),
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = MessageResponse),
        (status = 400, description = "Missing name, missing category_id or invalid price", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = MessageResponse),
        (status = 404, description = "Category not found", body = MessageResponse)
    )
)]
pub async fn create_product(
    State(state): State<ProductHandlerState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let name = require_name(request.name.as_deref())?;
    let category_id = request
        .category_id
        .filter(|id| *id != 0)
        .ok_or_else(|| ApiError::validation("Missing category_id"))?;
    let price = check_price(request.price)?;

    ensure_category_exists(&state.db, category_id).await?;

    let now = Utc::now();
    let new_product = product::ActiveModel {
        name: Set(name.to_string()),
        description: Set(normalize_optional(request.description)),
        category_id: Set(category_id),
        price: Set(price),
        image_url: Set(normalize_optional(request.image_url)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    new_product.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Product created")),
    ))
}

/// Update a product
///
/// Only provided fields change; a body with no updatable field answers 400.
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = MessageResponse),
        (status = 400, description = "Invalid field or no fields to update", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = MessageResponse),
        (status = 404, description = "Product or category not found", body = MessageResponse)
    )
)]
pub async fn update_product(
    State(state): State<ProductHandlerState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let existing = product::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    if let Some(name) = request.name.as_deref() {
        if name.trim().is_empty() {
            return Err(ApiError::validation("Invalid product name"));
        }
    }
    if let Some(price) = request.price {
        check_price(Some(price))?;
    }
    if let Some(category_id) = request.category_id {
        ensure_category_exists(&state.db, category_id).await?;
    }

    let mut active: product::ActiveModel = existing.into();
    let mut changed = false;
    if let Some(name) = request.name.as_deref() {
        active.name = Set(name.trim().to_string());
        changed = true;
    }
    if let Some(description) = request.description {
        active.description = Set(normalize_optional(description));
        changed = true;
    }
    if let Some(price) = request.price {
        active.price = Set(price);
        changed = true;
    }
    if let Some(image_url) = request.image_url {
        active.image_url = Set(normalize_optional(image_url));
        changed = true;
    }
    if let Some(category_id) = request.category_id {
        active.category_id = Set(category_id);
        changed = true;
    }
    if !changed {
        return Err(ApiError::validation("No fields to update"));
    }

    active.updated_at = Set(Utc::now());
    active.update(&state.db).await?;

    Ok(Json(MessageResponse::new("Product updated")))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = MessageResponse),
        (status = 404, description = "Product not found", body = MessageResponse)
    )
)]
pub async fn delete_product(
    State(state): State<ProductHandlerState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    product::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    product::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(Json(MessageResponse::new("Product deleted")))
}
