use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

pub async fn connect_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true);

    Database::connect(opt).await
}

/// Connect and bring the schema up to date.
pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = connect_db(db_url).await?;
    sync_schema(&db).await?;
    Ok(db)
}

/// Create or extend every table declared under [`crate::entity`].
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.get_schema_registry("blog_server::entity::*")
        .sync(db)
        .await
}
