use serde::{Deserialize, Serialize};

/// Markdown to preview.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RenderRequest {
    #[serde(default)]
    #[schema(example = "Hello **world**, see https://example.com")]
    pub markdown_text: String,
}

/// Sanitized HTML. Links open in a new tab.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RenderResponse {
    pub html: String,
}
