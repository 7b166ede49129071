pub mod auth;
pub mod blog;
pub mod category;
pub mod media;
pub mod post;
pub mod render;
pub mod shared;
