use axum::{
    Router,
    routing::{get, post, put},
};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .nest("/admin", admin_routes(config))
        .nest("/blog", blog_routes())
}

fn admin_routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/categories", category_routes())
        .nest("/posts", post_routes())
        .nest("/uploads", upload_routes(config))
        .route("/render", post(handlers::render::render_markdown))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::category::list_categories).post(handlers::category::create_category),
        )
        .route("/reorder", put(handlers::category::reorder_categories))
        .route(
            "/{id}",
            get(handlers::category::get_category)
                .patch(handlers::category::update_category)
                .delete(handlers::category::delete_category),
        )
}

fn post_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::post::list_posts).post(handlers::post::create_post),
        )
        .route(
            "/{id}",
            get(handlers::post::get_post)
                .patch(handlers::post::update_post)
                .delete(handlers::post::delete_post),
        )
}

fn upload_routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .route("/images", post(handlers::media::upload_image))
        .layer(handlers::media::upload_body_limit(config.media.max_upload_size))
}

fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::blog::blog_index))
        .route("/categories", get(handlers::blog::list_blog_categories))
        .route("/categories/{slug}", get(handlers::blog::get_blog_category))
        .route(
            "/categories/{category_slug}/posts/{post_slug}",
            get(handlers::blog::get_blog_post),
        )
}
