use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::ReorderOutcome;
use crate::entity::blog_category;
use crate::error::AppError;

pub use super::shared::{validate_required_text, validate_slug};

pub const MAX_SLUG_LENGTH: usize = 50;
pub const MAX_NAME_LENGTH: usize = 50;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCategoryRequest {
    #[schema(example = "rust")]
    pub slug: String,
    #[schema(example = "Rust")]
    pub name: String,
}

pub fn validate_create_category(payload: &CreateCategoryRequest) -> Result<(), AppError> {
    validate_slug(payload.slug.trim(), MAX_SLUG_LENGTH)?;
    validate_required_text(&payload.name, "Name", MAX_NAME_LENGTH)
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateCategoryRequest {
    pub slug: Option<String>,
    pub name: Option<String>,
}

pub fn validate_update_category(payload: &UpdateCategoryRequest) -> Result<(), AppError> {
    if let Some(slug) = &payload.slug {
        validate_slug(slug.trim(), MAX_SLUG_LENGTH)?;
    }
    if let Some(name) = &payload.name {
        validate_required_text(name, "Name", MAX_NAME_LENGTH)?;
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReorderCategoriesRequest {
    /// Every category ID, in the desired display order.
    #[schema(example = json!([3, 1, 2]))]
    pub category_ids: Vec<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub order_index: i32,
    /// Number of posts in the category, published or not.
    pub post_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryResponse {
    pub fn new(category: blog_category::Model, post_count: i64) -> Self {
        Self {
            id: category.id,
            slug: category.slug,
            name: category.name,
            order_index: category.order_index,
            post_count,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReorderCategoriesResponse {
    /// `stale` means the submission did not name exactly the stored categories
    /// and nothing was changed.
    pub outcome: ReorderOutcome,
    /// Categories in their stored order after the request.
    pub categories: Vec<CategoryResponse>,
}
