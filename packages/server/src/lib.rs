pub mod admin;
pub mod category;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod media;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Blog API",
        version = "1.0.0",
        description = "Admin and public API of the blog"
    ),
    paths(
        handlers::auth::login,
        handlers::auth::me,
        handlers::category::list_categories,
        handlers::category::create_category,
        handlers::category::reorder_categories,
        handlers::category::get_category,
        handlers::category::update_category,
        handlers::category::delete_category,
        handlers::post::list_posts,
        handlers::post::create_post,
        handlers::post::get_post,
        handlers::post::update_post,
        handlers::post::delete_post,
        handlers::render::render_markdown,
        handlers::media::upload_image,
        handlers::media::serve_media,
        handlers::blog::blog_index,
        handlers::blog::list_blog_categories,
        handlers::blog::get_blog_category,
        handlers::blog::get_blog_post,
    ),
    tags(
        (name = "Auth", description = "Admin authentication"),
        (name = "Categories", description = "Category management and ordering"),
        (name = "Posts", description = "Post management and Markdown preview"),
        (name = "Media", description = "Image uploads and stored file delivery"),
        (name = "Blog", description = "Public read-only blog"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let api = ApiDoc::openapi();

    let mut router = axum::Router::new().nest("/api", routes::api_routes(&state.config));
    if state.config.media.serve_files {
        router = router.merge(routes::media_routes(&state.config));
    }

    router
        .layer(cors_layer(&state.config.server.cors))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
}
