use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::collection::FileCollection;
use super::error::StorageError;
use super::hash::ContentHash;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// An upload fully written to private temporary storage.
///
/// The temporary file is deleted when the value is dropped, whatever the
/// outcome of the surrounding store operation.
#[derive(Debug)]
pub struct SpooledFile {
    pub(crate) path: PathBuf,
    pub hash: ContentHash,
    pub size: u64,
    pub mime_type: &'static str,
}

impl SpooledFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SpooledFile {
    fn drop(&mut self) {
        // Best effort.
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Collection-scoped file storage under a media root.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stream `reader` to a temporary file while hashing, counting and sniffing it.
    async fn spool(
        &self,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<SpooledFile, StorageError>;

    /// Place a spooled file at `collection/filename`.
    ///
    /// Fails with [`StorageError::AlreadyExists`] instead of overwriting.
    async fn materialize(
        &self,
        spooled: &SpooledFile,
        collection: FileCollection,
        filename: &str,
    ) -> Result<(), StorageError>;

    /// Open a stored file, returning the reader and its length in bytes.
    async fn open(
        &self,
        collection: FileCollection,
        filename: &str,
    ) -> Result<(BoxReader, u64), StorageError>;

    /// Delete a stored file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn remove(&self, collection: FileCollection, filename: &str)
    -> Result<bool, StorageError>;
}
