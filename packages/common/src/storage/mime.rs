/// Number of leading bytes inspected when sniffing a MIME type.
pub const SNIFF_LEN: usize = 2048;

/// Detect a MIME type from leading content bytes.
///
/// Magic-byte signatures win. Otherwise non-empty valid UTF-8 without NUL bytes
/// is `text/plain`. A prefix cut mid-character still counts as text.
pub fn sniff_mime_type(prefix: &[u8]) -> &'static str {
    if prefix.is_empty() {
        return "application/x-empty";
    }

    if let Some(kind) = infer::get(prefix) {
        return kind.mime_type();
    }

    if looks_like_text(prefix) {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}

fn looks_like_text(prefix: &[u8]) -> bool {
    if prefix.contains(&0) {
        return false;
    }
    match std::str::from_utf8(prefix) {
        Ok(_) => true,
        // A multi-byte character split by the sniff window.
        Err(e) => e.error_len().is_none() && prefix.len() - e.valid_up_to() < 4,
    }
}
