use std::fmt;

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// Upper bound on a stored filename, matching the width of the `filename` column.
pub const MAX_FILENAME_LENGTH: usize = 200;

/// Extension substituted when sanitizing leaves nothing usable.
pub const FALLBACK_EXTENSION: &str = "txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilenameError {
    /// The original filename carries no extension to keep.
    MissingExtension,
    /// The extension alone leaves no room for a name within the length bound.
    ExtensionTooLong { extension_len: usize, max_len: usize },
}

impl fmt::Display for FilenameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingExtension => write!(f, "filename must have an extension"),
            Self::ExtensionTooLong {
                extension_len,
                max_len,
            } => write!(
                f,
                "extension of {extension_len} characters does not fit a {max_len} character filename"
            ),
        }
    }
}

impl std::error::Error for FilenameError {}

/// Reduce a user-supplied filename to a flat ASCII name safe for paths and URLs.
///
/// Characters are transliterated via NFKD and anything non-ASCII is dropped.
/// Path separators and whitespace runs become `_`, characters outside
/// `[A-Za-z0-9_.-]` are removed, and leading or trailing `.`/`_` are stripped.
/// Case is preserved. The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if matches!(c, '/' | '\\') { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Whether `name` is already in the form [`secure_filename`] produces.
pub fn is_secure_filename(name: &str) -> bool {
    !name.is_empty() && secure_filename(name) == name
}

/// Split a filename at its last dot into `(name, extension)`.
///
/// Leading dots of the final path component do not start an extension, so
/// `.bashrc` has none. The returned extension excludes the dot and may be
/// empty for names ending in a dot.
pub fn split_extension(filename: &str) -> Option<(&str, &str)> {
    let base_start = filename.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let base = &filename[base_start..];
    let leading_dots = base.len() - base.trim_start_matches('.').len();
    let dot = base_start + leading_dots + base[leading_dots..].rfind('.')?;
    Some((&filename[..dot], &filename[dot + 1..]))
}

/// Produces the sequence of filenames to try for a new stored file.
///
/// The first candidate is the sanitized base name. After it come `name-1.ext`
/// through `name-{max_suffix}.ext`, with the name shortened so the suffix fits
/// the length bound. The iterator ends once the suffix bound is used up.
#[derive(Debug, Clone)]
pub struct FilenameCandidates {
    name: String,
    extension: String,
    max_name_len: usize,
    suffix_width: usize,
    max_suffix: u32,
    next_suffix: u32,
}

impl FilenameCandidates {
    pub fn new(original: &str, max_len: usize, max_suffix: u32) -> Result<Self, FilenameError> {
        let (raw_name, raw_extension) =
            split_extension(original).ok_or(FilenameError::MissingExtension)?;

        let mut name = secure_filename(raw_name);
        if name.is_empty() {
            name = Uuid::new_v4().simple().to_string();
        }

        let mut extension = secure_filename(raw_extension);
        if extension.is_empty() {
            extension = FALLBACK_EXTENSION.to_string();
        }

        // "-" plus the digits of the largest suffix.
        let suffix_width = 1 + max_suffix.to_string().len();
        let max_name_len = max_len
            .checked_sub(1 + extension.len())
            .filter(|&len| len > suffix_width)
            .ok_or(FilenameError::ExtensionTooLong {
                extension_len: extension.len(),
                max_len,
            })?;

        Ok(Self {
            name,
            extension,
            max_name_len,
            suffix_width,
            max_suffix,
            next_suffix: 0,
        })
    }

    pub fn max_suffix(&self) -> u32 {
        self.max_suffix
    }

    fn truncated_name(&self, limit: usize) -> &str {
        &self.name[..self.name.len().min(limit)]
    }
}

impl Iterator for FilenameCandidates {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let suffix = self.next_suffix;
        if suffix > self.max_suffix {
            return None;
        }
        self.next_suffix += 1;

        if suffix == 0 {
            let name = self.truncated_name(self.max_name_len);
            return Some(format!("{name}.{}", self.extension));
        }

        let name = self.truncated_name(self.max_name_len - self.suffix_width);
        Some(format!("{name}-{suffix}.{}", self.extension))
    }
}
