//! Markdown handling for author-supplied content.
//!
//! Rendering turns Markdown into sanitized HTML; reference extraction finds
//! self-hosted stored files linked from the raw source.

mod references;
mod render;

pub use references::{extract_file_references, extract_markdown_urls, hosted_file};
pub use render::{ALLOWED_PROTOCOLS, ALLOWED_TAGS, LinkTarget, markdown_to_html};
