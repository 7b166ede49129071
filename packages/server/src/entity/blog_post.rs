use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blog_post")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub category_id: i32,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: HasOne<super::blog_category::Entity>,

    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub tagline: String,
    #[sea_orm(column_type = "Text")]
    pub content: String, // in Markdown

    pub header_image_file_id: Option<i32>,

    #[sea_orm(default_value = false, indexed)]
    pub featured: bool,
    #[sea_orm(indexed)]
    pub published_at: Option<DateTimeUtc>,

    #[sea_orm(has_many, via = "blog_post_file")]
    pub files: HasMany<super::stored_file::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
