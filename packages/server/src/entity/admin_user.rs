use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Token subject. Rotating it revokes every token issued before.
    #[sea_orm(unique)]
    pub public_id: String,
    #[sea_orm(unique)]
    pub email_address: String,
    pub password_hash: String,

    #[sea_orm(default_value = true)]
    pub active: bool,
    pub last_login_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
