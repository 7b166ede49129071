use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::blog_post;
use crate::error::AppError;

use super::shared::{double_option, validate_optional_text, validate_required_text, validate_slug};

pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_SLUG_LENGTH: usize = 100;
pub const MAX_TAGLINE_LENGTH: usize = 100;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePostRequest {
    pub category_id: i32,
    #[schema(example = "Announcing the new blog")]
    pub title: String,
    #[schema(example = "announcing-the-new-blog")]
    pub slug: String,
    #[serde(default)]
    pub tagline: String,
    /// Markdown source.
    #[serde(default)]
    pub content: String,
    pub header_image_file_id: Option<i32>,
    #[serde(default)]
    pub featured: bool,
    /// Publish immediately.
    #[serde(default)]
    pub published: bool,
}

pub fn validate_create_post(payload: &CreatePostRequest) -> Result<(), AppError> {
    validate_required_text(&payload.title, "Title", MAX_TITLE_LENGTH)?;
    validate_slug(payload.slug.trim(), MAX_SLUG_LENGTH)?;
    validate_optional_text(&payload.tagline, "Tagline", MAX_TAGLINE_LENGTH)
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdatePostRequest {
    pub category_id: Option<i32>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub tagline: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub header_image_file_id: Option<Option<i32>>,
    pub featured: Option<bool>,
    /// `true` publishes an unpublished post now; `false` unpublishes it.
    pub published: Option<bool>,
}

pub fn validate_update_post(payload: &UpdatePostRequest) -> Result<(), AppError> {
    if let Some(title) = &payload.title {
        validate_required_text(title, "Title", MAX_TITLE_LENGTH)?;
    }
    if let Some(slug) = &payload.slug {
        validate_slug(slug.trim(), MAX_SLUG_LENGTH)?;
    }
    if let Some(tagline) = &payload.tagline {
        validate_optional_text(tagline, "Tagline", MAX_TAGLINE_LENGTH)?;
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PostResponse {
    pub id: i32,
    pub category_id: i32,
    pub title: String,
    pub slug: String,
    pub tagline: String,
    /// Markdown source.
    pub content: String,
    /// Sanitized HTML rendered from `content`.
    pub rendered_content: String,
    pub header_image_file_id: Option<i32>,
    pub featured: bool,
    pub published_at: Option<DateTime<Utc>>,
    /// Stored files referenced from `content`.
    pub referenced_file_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PostListItem {
    pub id: i32,
    pub category_id: i32,
    pub title: String,
    pub slug: String,
    pub featured: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<blog_post::Model> for PostListItem {
    fn from(post: blog_post::Model) -> Self {
        Self {
            id: post.id,
            category_id: post.category_id,
            title: post.title,
            slug: post.slug,
            featured: post.featured,
            published_at: post.published_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PostListResponse {
    pub posts: Vec<PostListItem>,
}
