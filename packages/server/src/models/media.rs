use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageMetadata {
    /// Suggested alt text: the stored filename without extension.
    #[schema(example = "holiday_photo")]
    pub alt: String,
}

/// A stored image, newly created or matched by content.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadImageResponse {
    pub file_id: i32,
    /// Always `image`.
    #[schema(example = "image")]
    pub file_type: &'static str,
    /// URL the file is served under.
    #[schema(example = "/media/images/holiday_photo.png")]
    pub file_url: String,
    #[schema(example = "holiday_photo.png")]
    pub filename: String,
    /// `false` when identical content was already stored.
    pub new_file: bool,
    pub metadata: ImageMetadata,
}
