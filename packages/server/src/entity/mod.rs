pub mod admin_user;
pub mod blog_category;
pub mod blog_post;
pub mod blog_post_file;
pub mod stored_file;
