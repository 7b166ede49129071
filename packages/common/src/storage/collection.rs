use std::fmt;
use std::str::FromStr;

/// Closed set of buckets that stored files are partitioned into.
///
/// Each collection maps to a directory of the same name under the media root
/// and to the matching segment of the public media URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileCollection {
    Images,
}

impl FileCollection {
    pub const ALL: &'static [FileCollection] = &[FileCollection::Images];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Images => "images",
        }
    }
}

impl fmt::Display for FileCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileCollection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown file collection: {s}"))
    }
}
