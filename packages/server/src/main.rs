use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use blog_common::storage::filesystem::FilesystemMediaStore;
use tracing::{Level, info};

use blog_server::config::AppConfig;
use blog_server::database::init_db;
use blog_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    let level = Level::from_str(&config.log.level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let db = init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    let media = FilesystemMediaStore::new(config.media.dir.clone(), config.media.max_upload_size)
        .await
        .context("Failed to prepare media directory")?;
    info!(dir = %media.root().display(), "Media store ready");

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid server.host")?,
        config.server.port,
    );
    let state = AppState {
        db,
        config,
        media: Arc::new(media),
    };
    let app = blog_server::build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
