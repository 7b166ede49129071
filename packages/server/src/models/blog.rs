use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::{blog_category, blog_post};

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicCategory {
    pub slug: String,
    pub name: String,
}

impl From<blog_category::Model> for PublicCategory {
    fn from(category: blog_category::Model) -> Self {
        Self {
            slug: category.slug,
            name: category.name,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicPostSummary {
    pub slug: String,
    pub title: String,
    pub tagline: String,
    pub header_image_file_id: Option<i32>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<blog_post::Model> for PublicPostSummary {
    fn from(post: blog_post::Model) -> Self {
        Self {
            slug: post.slug,
            title: post.title,
            tagline: post.tagline,
            header_image_file_id: post.header_image_file_id,
            published_at: post.published_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CategorySection {
    pub category: PublicCategory,
    pub posts: Vec<PublicPostSummary>,
}

/// Front page: featured posts, then the newest posts of each category.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BlogIndexResponse {
    pub featured: Vec<PublicPostSummary>,
    pub sections: Vec<CategorySection>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicCategoryListResponse {
    pub categories: Vec<PublicCategory>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicPostResponse {
    pub category: PublicCategory,
    pub slug: String,
    pub title: String,
    pub tagline: String,
    pub header_image_file_id: Option<i32>,
    pub published_at: Option<DateTime<Utc>>,
    /// Sanitized HTML.
    pub html: String,
}
