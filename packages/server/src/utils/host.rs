use std::sync::LazyLock;

use axum::http::{HeaderMap, header::HOST};
use url::Url;

static LOCALHOST: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost/").expect("static URL parses"));

/// Base URL of the host the request was addressed to.
///
/// Falls back to `http://localhost/` when the `Host` header is absent or
/// malformed. Only host and port matter to callers.
pub fn request_host_url(headers: &HeaderMap) -> Url {
    headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .and_then(|host| Url::parse(&format!("http://{host}/")).ok())
        .unwrap_or_else(|| LOCALHOST.clone())
}
