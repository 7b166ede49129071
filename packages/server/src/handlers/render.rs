use axum::Json;
use blog_common::markdown::{LinkTarget, markdown_to_html};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthAdmin;
use crate::extractors::json::AppJson;
use crate::models::render::{RenderRequest, RenderResponse};

#[utoipa::path(
    post,
    path = "/api/v1/admin/render",
    tag = "Posts",
    operation_id = "renderMarkdown",
    summary = "Preview Markdown",
    description = "Renders Markdown to sanitized HTML the way post content is shown, with links opening in a new tab.",
    request_body = RenderRequest,
    responses(
        (status = 200, description = "Rendered HTML", body = RenderResponse),
        (status = 400, description = "Empty text (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(_auth_admin, payload), fields(len = payload.markdown_text.len()))]
pub async fn render_markdown(
    _auth_admin: AuthAdmin,
    AppJson(payload): AppJson<RenderRequest>,
) -> Result<Json<RenderResponse>, AppError> {
    if payload.markdown_text.trim().is_empty() {
        return Err(AppError::Validation("markdown_text must not be empty".into()));
    }

    Ok(Json(RenderResponse {
        html: markdown_to_html(&payload.markdown_text, Some(LinkTarget::Blank)),
    }))
}
