mod v1;

use axum::{Router, routing::get};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> Router<AppState> {
    Router::new().nest("/v1", v1::routes(config))
}

/// Stored files under the configured URL prefix.
pub fn media_routes(config: &AppConfig) -> Router<AppState> {
    let prefix = config.media.url_prefix.trim_matches('/');
    let path = if prefix.is_empty() {
        "/{collection}/{filename}".to_string()
    } else {
        format!("/{prefix}/{{collection}}/{{filename}}")
    };
    Router::new().route(&path, get(handlers::media::serve_media))
}
