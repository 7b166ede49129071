use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued access tokens.
    pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    /// Root directory holding one subdirectory per file collection.
    pub dir: PathBuf,
    /// Public URL prefix stored files are served under, e.g. `/media/`.
    pub url_prefix: String,
    /// Largest accepted upload in bytes.
    pub max_upload_size: u64,
    /// Highest numeric suffix tried when a filename is taken.
    pub max_filename_suffix: u32,
    /// Serve stored files from this process.
    pub serve_files: bool,
}

impl MediaConfig {
    /// Public URL of a stored file.
    pub fn file_url(&self, collection: &str, filename: &str) -> String {
        format!(
            "/{}/{collection}/{filename}",
            self.url_prefix.trim_matches('/')
        )
        .replace("//", "/")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub log: LogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.token_ttl_hours", 168)?
            .set_default("media.url_prefix", "/media/")?
            .set_default("media.max_upload_size", 16 * 1024 * 1024)?
            .set_default("media.max_filename_suffix", 99)?
            .set_default("media.serve_files", true)?
            .set_default("log.level", "info")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., BLOG__MEDIA__DIR)
            .add_source(Environment::with_prefix("BLOG").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
