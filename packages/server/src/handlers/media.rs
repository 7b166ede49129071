use std::io;
use std::pin::pin;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use blog_common::storage::filename::split_extension;
use blog_common::storage::{FileCollection, StorageError};
use futures::TryStreamExt;
use sea_orm::*;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::instrument;

use crate::entity::stored_file;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthAdmin;
use crate::media::{FileStore, IMAGE_EXTENSIONS, IMAGE_MIME_TYPES};
use crate::models::media::{ImageMetadata, UploadImageResponse};
use crate::state::AppState;

/// Body limit for the upload route: the file limit plus room for multipart framing.
pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let limit = max_upload_size.saturating_add(64 * 1024);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/uploads/images",
    tag = "Media",
    operation_id = "uploadImage",
    summary = "Upload an image",
    description = "Stores an image from the `image_file` multipart field. The extension must be \
        gif, jpeg, jpg, png or webp and the content must be one of those formats. Content that is \
        already stored returns the existing file with status 200.",
    request_body(content_type = "multipart/form-data", description = "Image in the `image_file` field"),
    responses(
        (status = 201, description = "New file stored", body = UploadImageResponse),
        (status = 200, description = "Identical content already stored", body = UploadImageResponse),
        (status = 400, description = "Missing file, bad extension, wrong content type or too large (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "No free filename left (RESOURCE_EXHAUSTED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_admin, state, multipart), fields(user_id = auth_admin.user_id))]
pub async fn upload_image(
    auth_admin: AuthAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let collection = FileCollection::Images;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("image_file") {
            continue; // Ignore unknown fields.
        }

        let filename = field
            .file_name()
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
        require_image_extension(&filename)?;

        let reader = StreamReader::new(field.map_err(io::Error::other));
        let mut reader = pin!(reader);
        let spooled = state.media.spool(&mut reader).await?;

        if !IMAGE_MIME_TYPES.contains(&spooled.mime_type) {
            return Err(AppError::Validation(format!(
                "Unsupported image content type '{}'",
                spooled.mime_type
            )));
        }

        let store = FileStore::new(
            &state.db,
            state.media.as_ref(),
            state.config.media.max_filename_suffix,
        );
        let (file, new_file) = store.commit(&spooled, &filename, collection).await?;

        let status = if new_file {
            StatusCode::CREATED
        } else {
            StatusCode::OK
        };
        let alt = split_extension(&file.filename)
            .map_or(file.filename.as_str(), |(name, _)| name)
            .to_string();

        return Ok((
            status,
            Json(UploadImageResponse {
                file_id: file.id,
                file_type: "image",
                file_url: state.config.media.file_url(&file.collection, &file.filename),
                filename: file.filename,
                new_file,
                metadata: ImageMetadata { alt },
            }),
        ));
    }

    Err(AppError::Validation("Missing 'image_file' field".into()))
}

fn require_image_extension(filename: &str) -> Result<(), AppError> {
    let extension = split_extension(filename)
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Image filename must end in one of: {}",
            IMAGE_EXTENSIONS.join(", ")
        )))
    }
}

/// Stream a stored file.
#[utoipa::path(
    get,
    path = "/media/{collection}/{filename}",
    tag = "Media",
    operation_id = "serveMedia",
    summary = "Download a stored file",
    description = "Served under the configured media URL prefix. Supports ETag-based caching via If-None-Match.",
    params(
        ("collection" = String, Path, description = "File collection, e.g. `images`"),
        ("filename" = String, Path, description = "Stored filename"),
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn serve_media(
    State(state): State<AppState>,
    Path((collection, filename)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let not_found = || AppError::NotFound("File not found".into());
    let collection: FileCollection = collection.parse().map_err(|_| not_found())?;

    let file = stored_file::Entity::find()
        .filter(stored_file::Column::Collection.eq(collection.as_str()))
        .filter(stored_file::Column::Filename.eq(&filename))
        .one(&state.db)
        .await?
        .ok_or_else(not_found)?;

    let etag_value = format!("\"{}\"", file.content_hash);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let (reader, size) = state
        .media
        .open(collection, &file.filename)
        .await
        .map_err(|e| match e {
            StorageError::NotFound(_) => not_found(),
            other => AppError::from(other),
        })?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let content_type = mime_guess::from_path(&file.filename).first_or_octet_stream();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}
