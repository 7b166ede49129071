use axum::Json;
use axum::extract::{Path, State};
use blog_common::markdown::markdown_to_html;
use chrono::{DateTime, Utc};
use sea_orm::*;
use tracing::instrument;

use crate::category;
use crate::entity::{blog_category, blog_post};
use crate::error::{AppError, ErrorBody};
use crate::models::blog::*;
use crate::state::AppState;

const FEATURED_POSTS: u64 = 5;
const POSTS_PER_SECTION: u64 = 4;

/// Posts visible to readers at `now`, newest first.
fn published(now: DateTime<Utc>) -> Select<blog_post::Entity> {
    blog_post::Entity::find()
        .filter(blog_post::Column::PublishedAt.is_not_null())
        .filter(blog_post::Column::PublishedAt.lte(now))
        .order_by_desc(blog_post::Column::PublishedAt)
        .order_by_desc(blog_post::Column::Id)
}

#[utoipa::path(
    get,
    path = "/api/v1/blog",
    tag = "Blog",
    operation_id = "blogIndex",
    summary = "Blog front page",
    description = "Featured posts, then the newest posts of each category in display order. \
        Categories without published posts are left out.",
    responses((status = 200, description = "Front page", body = BlogIndexResponse)),
)]
#[instrument(skip(state))]
pub async fn blog_index(State(state): State<AppState>) -> Result<Json<BlogIndexResponse>, AppError> {
    let now = Utc::now();

    let featured = published(now)
        .filter(blog_post::Column::Featured.eq(true))
        .limit(FEATURED_POSTS)
        .all(&state.db)
        .await?;

    let mut sections = Vec::new();
    for category in category::list_ordered(&state.db).await? {
        let posts = published(now)
            .filter(blog_post::Column::CategoryId.eq(category.id))
            .limit(POSTS_PER_SECTION)
            .all(&state.db)
            .await?;
        if posts.is_empty() {
            continue;
        }
        sections.push(CategorySection {
            category: category.into(),
            posts: posts.into_iter().map(PublicPostSummary::from).collect(),
        });
    }

    Ok(Json(BlogIndexResponse {
        featured: featured.into_iter().map(PublicPostSummary::from).collect(),
        sections,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/blog/categories",
    tag = "Blog",
    operation_id = "blogCategories",
    summary = "Categories in display order",
    responses((status = 200, description = "Categories", body = PublicCategoryListResponse)),
)]
#[instrument(skip(state))]
pub async fn list_blog_categories(
    State(state): State<AppState>,
) -> Result<Json<PublicCategoryListResponse>, AppError> {
    let categories = category::list_ordered(&state.db).await?;
    Ok(Json(PublicCategoryListResponse {
        categories: categories.into_iter().map(PublicCategory::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/blog/categories/{slug}",
    tag = "Blog",
    operation_id = "blogCategory",
    summary = "A category with its published posts",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category page", body = CategorySection),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_blog_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategorySection>, AppError> {
    let category = find_category_by_slug(&state.db, &slug).await?;
    let posts = published(Utc::now())
        .filter(blog_post::Column::CategoryId.eq(category.id))
        .all(&state.db)
        .await?;

    Ok(Json(CategorySection {
        category: category.into(),
        posts: posts.into_iter().map(PublicPostSummary::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/blog/categories/{category_slug}/posts/{post_slug}",
    tag = "Blog",
    operation_id = "blogPost",
    summary = "A published post",
    params(
        ("category_slug" = String, Path, description = "Category slug"),
        ("post_slug" = String, Path, description = "Post slug"),
    ),
    responses(
        (status = 200, description = "Post with rendered HTML", body = PublicPostResponse),
        (status = 404, description = "Post not found or not published (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_blog_post(
    State(state): State<AppState>,
    Path((category_slug, post_slug)): Path<(String, String)>,
) -> Result<Json<PublicPostResponse>, AppError> {
    let category = find_category_by_slug(&state.db, &category_slug).await?;
    let post = published(Utc::now())
        .filter(blog_post::Column::CategoryId.eq(category.id))
        .filter(blog_post::Column::Slug.eq(&post_slug))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

    Ok(Json(PublicPostResponse {
        html: markdown_to_html(&post.content, None),
        category: category.into(),
        slug: post.slug,
        title: post.title,
        tagline: post.tagline,
        header_image_file_id: post.header_image_file_id,
        published_at: post.published_at,
    }))
}

async fn find_category_by_slug<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<blog_category::Model, AppError> {
    blog_category::Entity::find()
        .filter(blog_category::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))
}
