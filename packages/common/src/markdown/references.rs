use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::storage::FileCollection;

/// URL-shaped constructs in Markdown source that may point at stored files.
static URL_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        // ![alt](url)
        Regex::new(r"!\[[^\]]*\]\(\s*([^\s)]+)\s*\)"),
        // ![alt](<url>)
        Regex::new(r"!\[[^\]]*\]\(\s*<\s*([^\s>)]+)\s*>\s*\)"),
        // [label]: url
        Regex::new(r"(?m)^\[[^\]]+\]:\s+(\S+)\s*$"),
        // [label]: <url>
        Regex::new(r"(?m)^\[[^\]]+\]:\s+<([^>\s]+)>\s*$"),
    ]
    .map(|pattern| pattern.expect("static pattern compiles"))
});

/// Collect candidate URLs from inline images and reference definitions.
pub fn extract_markdown_urls(markdown_text: &str) -> Vec<&str> {
    let mut urls = Vec::new();
    for (i, pattern) in URL_PATTERNS.iter().enumerate() {
        for captures in pattern.captures_iter(markdown_text) {
            let Some(url) = captures.get(1).map(|m| m.as_str()) else {
                continue;
            };
            // Angle-bracketed definitions belong to the last pattern.
            if i == 2 && (url.starts_with('<') || url.ends_with('>')) {
                continue;
            }
            urls.push(url);
        }
    }
    urls
}

/// Resolve `url` against the request's `host_url` and match it against the
/// media URL shape `/{prefix}/{collection}/{filename}`.
///
/// Returns `None` for other hosts, other paths, and unknown collections.
pub fn hosted_file(
    url: &str,
    host_url: &Url,
    media_url_prefix: &str,
) -> Option<(FileCollection, String)> {
    let resolved = host_url.join(url.trim()).ok()?;
    if resolved.host_str() != host_url.host_str() || resolved.port() != host_url.port() {
        return None;
    }

    let (collection, filename) = match_media_path(resolved.path(), media_url_prefix)?;
    Some((collection, filename.to_string()))
}

fn match_media_path<'p>(path: &'p str, media_url_prefix: &str) -> Option<(FileCollection, &'p str)> {
    let prefix = media_url_prefix.trim_matches('/');
    let mut rest = path.strip_prefix('/')?.trim_start_matches('/');
    if !prefix.is_empty() {
        rest = rest.strip_prefix(prefix)?.strip_prefix('/')?.trim_start_matches('/');
    }

    let (collection, filename) = rest.split_once('/')?;
    let filename = filename.trim_start_matches('/');
    if filename.is_empty() || filename.contains('/') {
        return None;
    }

    Some((collection.parse().ok()?, filename))
}

/// Distinct `(collection, filename)` pairs of self-hosted files referenced by
/// `markdown_text`.
pub fn extract_file_references(
    markdown_text: &str,
    host_url: &Url,
    media_url_prefix: &str,
) -> BTreeSet<(FileCollection, String)> {
    extract_markdown_urls(markdown_text)
        .into_iter()
        .filter_map(|url| hosted_file(url, host_url, media_url_prefix))
        .collect()
}
