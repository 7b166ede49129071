use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stored_file")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub filename: String,
    #[sea_orm(indexed)]
    pub collection: String,
    pub mimetype: String,
    pub content_size: i64,
    /// Hex SHA-256 of the bytes. One row per distinct content across all collections.
    #[sea_orm(unique)]
    pub content_hash: String,

    #[sea_orm(has_many, via = "blog_post_file")]
    pub posts: HasMany<super::blog_post::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
