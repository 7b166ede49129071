use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored files referenced from a post's Markdown.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blog_post_file")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub post_id: i32,
    #[sea_orm(primary_key)]
    pub file_id: i32,
    #[sea_orm(belongs_to, from = "post_id", to = "id")]
    pub post: HasOne<super::blog_post::Entity>,
    #[sea_orm(belongs_to, from = "file_id", to = "id")]
    pub file: HasOne<super::stored_file::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
