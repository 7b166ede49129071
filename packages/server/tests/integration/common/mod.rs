use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::{Client, RequestBuilder};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use blog_common::storage::filesystem::FilesystemMediaStore;
use blog_server::admin::AdminUsers;
use blog_server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, LogConfig, MediaConfig, ServerConfig,
};
use blog_server::state::AppState;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct-horse";

/// Upload limit used by every test server.
pub const MAX_UPLOAD_SIZE: u64 = 1024 * 1024;

pub mod routes {
    pub const LOGIN: &str = "/api/v1/admin/auth/login";
    pub const ME: &str = "/api/v1/admin/auth/me";
    pub const CATEGORIES: &str = "/api/v1/admin/categories";
    pub const CATEGORIES_REORDER: &str = "/api/v1/admin/categories/reorder";
    pub const POSTS: &str = "/api/v1/admin/posts";
    pub const UPLOAD_IMAGE: &str = "/api/v1/admin/uploads/images";
    pub const RENDER: &str = "/api/v1/admin/render";
    pub const BLOG: &str = "/api/v1/blog";
    pub const BLOG_CATEGORIES: &str = "/api/v1/blog/categories";

    pub fn category(id: i32) -> String {
        format!("/api/v1/admin/categories/{id}")
    }

    pub fn post(id: i32) -> String {
        format!("/api/v1/admin/posts/{id}")
    }

    pub fn blog_category(slug: &str) -> String {
        format!("/api/v1/blog/categories/{slug}")
    }

    pub fn blog_post(category_slug: &str, post_slug: &str) -> String {
        format!("/api/v1/blog/categories/{category_slug}/posts/{post_slug}")
    }
}

/// Minimal valid-looking image payloads; `tag` makes the content distinct.
pub mod images {
    pub fn png(tag: &str) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(tag.as_bytes());
        bytes
    }

    pub fn jpeg(tag: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
        bytes.extend_from_slice(tag.as_bytes());
        bytes
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    media_dir: TempDir,
    _db_dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db_dir = tempfile::tempdir().expect("Failed to create database dir");
        let media_dir = tempfile::tempdir().expect("Failed to create media dir");

        let db_url = format!(
            "sqlite://{}?mode=rwc",
            db_dir.path().join("blog.db").display()
        );
        let db = blog_server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig { url: db_url },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                token_ttl_hours: 1,
            },
            media: MediaConfig {
                dir: media_dir.path().to_path_buf(),
                url_prefix: "/media/".to_string(),
                max_upload_size: MAX_UPLOAD_SIZE,
                max_filename_suffix: 99,
                serve_files: true,
            },
            log: LogConfig {
                level: "debug".to_string(),
            },
        };

        let media = FilesystemMediaStore::new(media_dir.path().to_path_buf(), MAX_UPLOAD_SIZE)
            .await
            .expect("Failed to create media store");

        let state = AppState {
            db: db.clone(),
            config: app_config,
            media: Arc::new(media),
        };

        let app = blog_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            media_dir,
            _db_dir: db_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn media_root(&self) -> &Path {
        self.media_dir.path()
    }

    /// Sorted names of the files stored in `collection`.
    pub fn stored_files(&self, collection: &str) -> Vec<String> {
        let dir: PathBuf = self.media_root().join(collection);
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    async fn send(&self, req: RequestBuilder, token: Option<&str>) -> TestResponse {
        let req = match token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let res = req.send().await.expect("request failed");
        TestResponse::from_response(res).await
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        self.send(self.client.post(self.url(path)).json(body), Some(token))
            .await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        self.send(self.client.post(self.url(path)).json(body), None)
            .await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        self.send(self.client.get(self.url(path)), Some(token)).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        self.send(self.client.get(self.url(path)), None).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        self.send(self.client.patch(self.url(path)).json(body), Some(token))
            .await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        self.send(self.client.put(self.url(path)).json(body), Some(token))
            .await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        self.send(self.client.delete(self.url(path)), Some(token))
            .await
    }

    pub async fn upload_with_token(
        &self,
        path: &str,
        field: &str,
        file_name: &str,
        file_bytes: Vec<u8>,
        token: &str,
    ) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part(field.to_string(), part);

        self.send(self.client.post(self.url(path)).multipart(form), Some(token))
            .await
    }

    /// Upload an image through the admin endpoint.
    pub async fn upload_image(&self, file_name: &str, bytes: Vec<u8>, token: &str) -> TestResponse {
        self.upload_with_token(routes::UPLOAD_IMAGE, "image_file", file_name, bytes, token)
            .await
    }

    /// Create an admin account directly in the database.
    pub async fn create_admin(&self, email: &str, password: &str) {
        AdminUsers::new(&self.db)
            .create(email, password)
            .await
            .expect("Failed to create admin");
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post_without_token(
            routes::LOGIN,
            &serde_json::json!({"email_address": email, "password": password}),
        )
        .await
    }

    /// Create the default admin and log in, returning the auth token.
    pub async fn admin_token(&self) -> String {
        self.create_admin(ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let res = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        res.body["token"]
            .as_str()
            .expect("Login response should contain a token")
            .to_string()
    }

    /// Create a category via the API and return its `id`.
    pub async fn create_category(&self, token: &str, slug: &str) -> i32 {
        let res = self
            .post_with_token(
                routes::CATEGORIES,
                &serde_json::json!({"slug": slug, "name": slug.to_uppercase()}),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_category failed: {}", res.text);
        res.id()
    }

    /// Create a post via the API and return its `id`.
    pub async fn create_post(&self, token: &str, body: Value) -> i32 {
        let res = self.post_with_token(routes::POSTS, &body, token).await;
        assert_eq!(res.status, 201, "create_post failed: {}", res.text);
        res.id()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }
}
