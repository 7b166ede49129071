use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use blog_common::markdown::markdown_to_html;
use sea_orm::*;
use tracing::instrument;
use url::Url;

use crate::entity::{blog_category, blog_post, blog_post_file, stored_file};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthAdmin;
use crate::extractors::json::AppJson;
use crate::media::detect_file_references;
use crate::models::post::*;
use crate::state::AppState;
use crate::utils::host::request_host_url;

#[utoipa::path(
    get,
    path = "/api/v1/admin/posts",
    tag = "Posts",
    operation_id = "listPosts",
    summary = "List posts",
    description = "Returns every post, published or not, newest first.",
    responses(
        (status = 200, description = "Posts", body = PostListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(_auth_admin, state))]
pub async fn list_posts(
    _auth_admin: AuthAdmin,
    State(state): State<AppState>,
) -> Result<Json<PostListResponse>, AppError> {
    let posts = blog_post::Entity::find()
        .order_by_desc(blog_post::Column::CreatedAt)
        .order_by_desc(blog_post::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(PostListResponse {
        posts: posts.into_iter().map(PostListItem::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/posts",
    tag = "Posts",
    operation_id = "createPost",
    summary = "Create a post",
    description = "Creates a post. Stored files linked from the Markdown content on this host \
        are recorded as references.",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_admin, state, headers, payload), fields(user_id = auth_admin.user_id, slug = %payload.slug))]
pub async fn create_post(
    auth_admin: AuthAdmin,
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(payload): AppJson<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_post(&payload)?;
    let host_url = request_host_url(&headers);

    let txn = state.db.begin().await?;
    require_category(&txn, payload.category_id).await?;
    if let Some(file_id) = payload.header_image_file_id {
        require_file(&txn, file_id).await?;
    }

    let now = chrono::Utc::now();
    let post = blog_post::ActiveModel {
        category_id: Set(payload.category_id),
        title: Set(payload.title.trim().to_string()),
        slug: Set(payload.slug.trim().to_string()),
        tagline: Set(payload.tagline.trim().to_string()),
        content: Set(payload.content),
        header_image_file_id: Set(payload.header_image_file_id),
        featured: Set(payload.featured),
        published_at: Set(payload.published.then_some(now)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(conflict_on_unique)?;

    let referenced = replace_file_references(
        &txn,
        post.id,
        &post.content,
        &host_url,
        &state.config.media.url_prefix,
    )
    .await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(post_response(post, referenced))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/posts/{id}",
    tag = "Posts",
    operation_id = "getPost",
    summary = "Get a post",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post", body = PostResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(_auth_admin, state), fields(post_id = id))]
pub async fn get_post(
    _auth_admin: AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PostResponse>, AppError> {
    let post = find_post(&state.db, id).await?;
    let referenced = referenced_file_ids(&state.db, id).await?;
    Ok(Json(post_response(post, referenced)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/posts/{id}",
    tag = "Posts",
    operation_id = "updatePost",
    summary = "Update a post",
    description = "Partially updates a post. Changing `content` re-derives the referenced files. \
        `published: true` stamps the publication time only if the post is not published yet.",
    params(("id" = i32, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated post", body = PostResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_admin, state, headers, payload), fields(user_id = auth_admin.user_id, post_id = id))]
pub async fn update_post(
    auth_admin: AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
    AppJson(payload): AppJson<UpdatePostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    validate_update_post(&payload)?;

    if payload == UpdatePostRequest::default() {
        let post = find_post(&state.db, id).await?;
        let referenced = referenced_file_ids(&state.db, id).await?;
        return Ok(Json(post_response(post, referenced)));
    }

    let txn = state.db.begin().await?;
    let existing = find_post_for_update(&txn, id).await?;
    let was_published = existing.published_at.is_some();

    if let Some(category_id) = payload.category_id {
        require_category(&txn, category_id).await?;
    }
    if let Some(Some(file_id)) = payload.header_image_file_id {
        require_file(&txn, file_id).await?;
    }

    let now = chrono::Utc::now();
    let content_changed = payload.content.is_some();
    let mut active: blog_post::ActiveModel = existing.into();
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(slug) = payload.slug {
        active.slug = Set(slug.trim().to_string());
    }
    if let Some(tagline) = payload.tagline {
        active.tagline = Set(tagline.trim().to_string());
    }
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    if let Some(header_image_file_id) = payload.header_image_file_id {
        active.header_image_file_id = Set(header_image_file_id);
    }
    if let Some(featured) = payload.featured {
        active.featured = Set(featured);
    }
    match payload.published {
        Some(true) if !was_published => active.published_at = Set(Some(now)),
        Some(false) => active.published_at = Set(None),
        _ => {}
    }
    active.updated_at = Set(now);

    let post = active.update(&txn).await.map_err(conflict_on_unique)?;

    let referenced = if content_changed {
        replace_file_references(
            &txn,
            post.id,
            &post.content,
            &request_host_url(&headers),
            &state.config.media.url_prefix,
        )
        .await?
    } else {
        referenced_file_ids(&txn, post.id).await?
    };
    txn.commit().await?;

    Ok(Json(post_response(post, referenced)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/posts/{id}",
    tag = "Posts",
    operation_id = "deletePost",
    summary = "Delete a post",
    description = "Deletes a post and its file references. The stored files stay.",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_admin, state), fields(user_id = auth_admin.user_id, post_id = id))]
pub async fn delete_post(
    auth_admin: AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    find_post_for_update(&txn, id).await?;

    blog_post_file::Entity::delete_many()
        .filter(blog_post_file::Column::PostId.eq(id))
        .exec(&txn)
        .await?;
    blog_post::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the post's recorded file references with those found in `content`.
async fn replace_file_references<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
    content: &str,
    host_url: &Url,
    media_url_prefix: &str,
) -> Result<Vec<i32>, AppError> {
    let files = detect_file_references(db, content, host_url, media_url_prefix).await?;
    let file_ids: Vec<i32> = files.iter().map(|f| f.id).collect();

    blog_post_file::Entity::delete_many()
        .filter(blog_post_file::Column::PostId.eq(post_id))
        .exec(db)
        .await?;

    if !file_ids.is_empty() {
        blog_post_file::Entity::insert_many(file_ids.iter().map(|&file_id| {
            blog_post_file::ActiveModel {
                post_id: Set(post_id),
                file_id: Set(file_id),
                ..Default::default()
            }
        }))
        .exec_without_returning(db)
        .await?;
    }

    tracing::debug!(post_id, count = file_ids.len(), "Recorded file references");
    Ok(file_ids)
}

async fn referenced_file_ids<C: ConnectionTrait>(db: &C, post_id: i32) -> Result<Vec<i32>, AppError> {
    let ids = blog_post_file::Entity::find()
        .filter(blog_post_file::Column::PostId.eq(post_id))
        .select_only()
        .column(blog_post_file::Column::FileId)
        .order_by_asc(blog_post_file::Column::FileId)
        .into_tuple::<i32>()
        .all(db)
        .await?;
    Ok(ids)
}

fn post_response(post: blog_post::Model, referenced_file_ids: Vec<i32>) -> PostResponse {
    PostResponse {
        rendered_content: markdown_to_html(&post.content, None),
        id: post.id,
        category_id: post.category_id,
        title: post.title,
        slug: post.slug,
        tagline: post.tagline,
        content: post.content,
        header_image_file_id: post.header_image_file_id,
        featured: post.featured,
        published_at: post.published_at,
        referenced_file_ids,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

async fn find_post<C: ConnectionTrait>(db: &C, id: i32) -> Result<blog_post::Model, AppError> {
    blog_post::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))
}

async fn find_post_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<blog_post::Model, AppError> {
    use sea_orm::sea_query::LockType;
    blog_post::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))
}

async fn require_category<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), AppError> {
    blog_category::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::Validation(format!("Category {id} does not exist")))
}

async fn require_file<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), AppError> {
    stored_file::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::Validation(format!("File {id} does not exist")))
}

fn conflict_on_unique(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A post with this slug already exists".into())
        }
        _ => AppError::from(err),
    }
}
