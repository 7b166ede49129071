use blog_common::markdown::extract_file_references;
use sea_orm::*;
use url::Url;

use crate::entity::stored_file;

/// Stored files referenced from `markdown_text` through URLs on `host_url`.
///
/// All references are looked up in a single query. Text without any
/// self-hosted reference never touches the database.
pub async fn detect_file_references<C: ConnectionTrait>(
    db: &C,
    markdown_text: &str,
    host_url: &Url,
    media_url_prefix: &str,
) -> Result<Vec<stored_file::Model>, DbErr> {
    let references = extract_file_references(markdown_text, host_url, media_url_prefix);
    if references.is_empty() {
        return Ok(Vec::new());
    }

    let condition = references
        .iter()
        .fold(Condition::any(), |any, (collection, filename)| {
            any.add(
                Condition::all()
                    .add(stored_file::Column::Collection.eq(collection.as_str()))
                    .add(stored_file::Column::Filename.eq(filename.as_str())),
            )
        });

    stored_file::Entity::find()
        .filter(condition)
        .order_by_asc(stored_file::Column::Id)
        .all(db)
        .await
}
