use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::category;
use crate::entity::{blog_category, blog_post};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthAdmin;
use crate::extractors::json::AppJson;
use crate::models::category::*;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/admin/categories",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List categories",
    description = "Returns all categories in display order with their post counts.",
    responses(
        (status = 200, description = "Ordered categories", body = CategoryListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(_auth_admin, state))]
pub async fn list_categories(
    _auth_admin: AuthAdmin,
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, AppError> {
    let categories = category::list_ordered(&state.db).await?;
    Ok(Json(CategoryListResponse {
        categories: with_post_counts(&state.db, categories).await?,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/categories",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    description = "Creates a category at the end of the display order.",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_admin, state, payload), fields(user_id = auth_admin.user_id, slug = %payload.slug))]
pub async fn create_category(
    auth_admin: AuthAdmin,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_category(&payload)?;

    let created = category::create(
        &state.db,
        payload.slug.trim().to_string(),
        payload.name.trim().to_string(),
    )
    .await
    .map_err(conflict_on_unique)?;

    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse::new(created, 0)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/categories/reorder",
    tag = "Categories",
    operation_id = "reorderCategories",
    summary = "Reorder categories",
    description = "Sets the display order. The list must name every category exactly once; \
        a list naming a different set of categories changes nothing and reports `stale` \
        together with the current order.",
    request_body = ReorderCategoriesRequest,
    responses(
        (status = 200, description = "Resulting order", body = ReorderCategoriesResponse),
        (status = 400, description = "Empty or duplicated list (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_admin, state, payload), fields(user_id = auth_admin.user_id, count = payload.category_ids.len()))]
pub async fn reorder_categories(
    auth_admin: AuthAdmin,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ReorderCategoriesRequest>,
) -> Result<Json<ReorderCategoriesResponse>, AppError> {
    let (outcome, categories) = category::reorder(&state.db, &payload.category_ids).await?;

    Ok(Json(ReorderCategoriesResponse {
        outcome,
        categories: with_post_counts(&state.db, categories).await?,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/categories/{id}",
    tag = "Categories",
    operation_id = "getCategory",
    summary = "Get a category",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(_auth_admin, state), fields(category_id = id))]
pub async fn get_category(
    _auth_admin: AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CategoryResponse>, AppError> {
    let category = find_category(&state.db, id).await?;
    let post_count = count_posts(&state.db, id).await?;
    Ok(Json(CategoryResponse::new(category, post_count)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/categories/{id}",
    tag = "Categories",
    operation_id = "updateCategory",
    summary = "Update a category",
    description = "Changes slug and/or name. Position changes go through the reorder endpoint.",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated category", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_admin, state, payload), fields(user_id = auth_admin.user_id, category_id = id))]
pub async fn update_category(
    auth_admin: AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    validate_update_category(&payload)?;

    let existing = find_category(&state.db, id).await?;
    let post_count = count_posts(&state.db, id).await?;
    if payload == UpdateCategoryRequest::default() {
        return Ok(Json(CategoryResponse::new(existing, post_count)));
    }

    let mut active: blog_category::ActiveModel = existing.into();
    if let Some(slug) = payload.slug {
        active.slug = Set(slug.trim().to_string());
    }
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    active.updated_at = Set(chrono::Utc::now());

    let updated = active.update(&state.db).await.map_err(conflict_on_unique)?;
    Ok(Json(CategoryResponse::new(updated, post_count)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/categories/{id}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a category",
    description = "Deletes an empty category. Categories that still hold posts cannot be deleted.",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Category has posts (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_admin, state), fields(user_id = auth_admin.user_id, category_id = id))]
pub async fn delete_category(
    auth_admin: AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    find_category(&state.db, id).await?;

    let post_count = count_posts(&state.db, id).await?;
    if post_count > 0 {
        return Err(AppError::Conflict(format!(
            "Category still has {post_count} post(s)"
        )));
    }

    blog_category::Entity::delete_by_id(id).exec(&state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_category<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<blog_category::Model, AppError> {
    blog_category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))
}

async fn count_posts<C: ConnectionTrait>(db: &C, category_id: i32) -> Result<i64, AppError> {
    let count = blog_post::Entity::find()
        .filter(blog_post::Column::CategoryId.eq(category_id))
        .count(db)
        .await?;
    Ok(i64::try_from(count).unwrap_or(i64::MAX))
}

async fn with_post_counts<C: ConnectionTrait>(
    db: &C,
    categories: Vec<blog_category::Model>,
) -> Result<Vec<CategoryResponse>, AppError> {
    let counts = category::post_counts(db).await?;
    Ok(categories
        .into_iter()
        .map(|c| {
            let count = counts.get(&c.id).copied().unwrap_or(0);
            CategoryResponse::new(c, count)
        })
        .collect())
}

fn conflict_on_unique(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A category with this slug already exists".into())
        }
        _ => AppError::from(err),
    }
}
