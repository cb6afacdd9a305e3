//! Category API handlers
//!
//! Listing is public; writes sit behind the bearer gate. Name comparisons
//! (duplicate checks, search, ordering) ride on the case-insensitive column
//! collation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::api::dto::{ListResponse, MessageResponse};
use crate::error::ApiError;
use crate::infrastructure::database::entities::category;

/// State for category handlers
#[derive(Clone)]
pub struct CategoryHandlerState {
    pub db: sea_orm::DatabaseConnection,
}

/// Category as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<category::Model> for CategoryDto {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
        }
    }
}

/// Create-category request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Update-category request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Query parameters for category listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryListParams {
    /// Substring filter on the name (case-insensitive)
    pub search: Option<String>,
}

fn require_name(name: Option<&str>) -> Result<&str, ApiError> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(ApiError::validation("Missing category name")),
    }
}

// Blank descriptions are stored as NULL
fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.is_empty())
}

/// List categories
///
/// Ordered by name; an optional `search` narrows by substring.
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Categories",
    params(CategoryListParams),
    responses(
        (status = 200, description = "Categories ordered by name", body = ListResponse<CategoryDto>)
    )
)]
pub async fn list_categories(
    State(state): State<CategoryHandlerState>,
    Query(params): Query<CategoryListParams>,
) -> Result<Json<ListResponse<CategoryDto>>, ApiError> {
    let mut query = category::Entity::find();
    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(category::Column::Name.contains(search));
    }
    let rows = query
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(ListResponse {
        data: rows.into_iter().map(CategoryDto::from).collect(),
    }))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Categories",
    security(("bearer_auth" = [])),
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = MessageResponse),
        (status = 400, description = "Missing category name", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = MessageResponse),
        (status = 409, description = "Category already exists", body = MessageResponse)
    )
)]
pub async fn create_category(
    State(state): State<CategoryHandlerState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let name = require_name(request.name.as_deref())?;

    let duplicate = category::Entity::find()
        .filter(category::Column::Name.eq(name))
        .one(&state.db)
        .await?;
    if duplicate.is_some() {
        return Err(ApiError::conflict("Category already exists"));
    }

    let new_category = category::ActiveModel {
        name: Set(name.to_string()),
        description: Set(normalize_description(request.description)),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    new_category.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Category created")),
    ))
}

/// Update a category
///
/// The name is required and replaces the old one; the description is always
/// overwritten (absent or blank clears it).
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    tag = "Categories",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = MessageResponse),
        (status = 400, description = "Missing category name", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = MessageResponse),
        (status = 404, description = "Category not found", body = MessageResponse),
        (status = 409, description = "Category name already exists", body = MessageResponse)
    )
)]
pub async fn update_category(
    State(state): State<CategoryHandlerState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let name = require_name(request.name.as_deref())?;

    let existing = category::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    // Another row may already hold this name (collation-aware comparison)
    let duplicate = category::Entity::find()
        .filter(category::Column::Id.ne(id))
        .filter(category::Column::Name.eq(name))
        .one(&state.db)
        .await?;
    if duplicate.is_some() {
        return Err(ApiError::conflict("Category name already exists"));
    }

    let mut active: category::ActiveModel = existing.into();
    active.name = Set(name.to_string());
    active.description = Set(normalize_description(request.description));
    active.update(&state.db).await?;

    Ok(Json(MessageResponse::new("Category updated")))
}

/// Delete a category
///
/// Fails with 500 when products still reference the category (restricting
/// foreign key).
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    tag = "Categories",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = MessageResponse),
        (status = 404, description = "Category not found", body = MessageResponse),
        (status = 500, description = "Store failure, typically a product still references the category", body = MessageResponse)
    )
)]
pub async fn delete_category(
    State(state): State<CategoryHandlerState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    category::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    match category::Entity::delete_by_id(id).exec(&state.db).await {
        Ok(_) => Ok(Json(MessageResponse::new("Category deleted")).into_response()),
        Err(e) => {
            tracing::error!("category delete failed: {e}");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Server error (maybe category is used by products)" })),
            )
                .into_response())
        }
    }
}
