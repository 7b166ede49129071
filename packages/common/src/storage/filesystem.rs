use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use super::collection::FileCollection;
use super::error::StorageError;
use super::filename::is_secure_filename;
use super::hash::ContentHash;
use super::mime::{SNIFF_LEN, sniff_mime_type};
use super::traits::{BoxReader, MediaStore, SpooledFile};

/// Read size used while spooling uploads.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Filesystem-backed media store.
///
/// Files live at `{root}/{collection}/{filename}`. Uploads are spooled to
/// `{root}/.tmp/{uuid}` first, so the final link into a collection directory
/// never exposes a partially written file.
pub struct FilesystemMediaStore {
    root: PathBuf,
    max_size: u64,
}

impl FilesystemMediaStore {
    /// Create a new filesystem media store rooted at `root`.
    pub async fn new(root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self { root, max_size })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn temp_path(&self) -> PathBuf {
        self.root
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    fn collection_dir(&self, collection: FileCollection) -> PathBuf {
        self.root.join(collection.as_str())
    }

    fn file_path(&self, collection: FileCollection, filename: &str) -> Result<PathBuf, StorageError> {
        if !is_secure_filename(filename) {
            return Err(StorageError::InvalidFilename(filename.to_string()));
        }
        Ok(self.collection_dir(collection).join(filename))
    }

    /// Copy fallback for filesystems without hard links.
    async fn copy_new(&self, src: &Path, dest: &Path, filename: &str) -> Result<(), StorageError> {
        let mut dest_file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(filename.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let result: Result<(), StorageError> = async {
            let mut src_file = fs::File::open(src).await?;
            tokio::io::copy(&mut src_file, &mut dest_file).await?;
            dest_file.sync_all().await?;
            Ok(())
        }
        .await;

        if result.is_err() {
            // Best effort.
            let _ = fs::remove_file(dest).await;
        }
        result
    }
}

#[async_trait]
impl MediaStore for FilesystemMediaStore {
    async fn spool(
        &self,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<SpooledFile, StorageError> {
        let temp_path = self.temp_path();

        let result: Result<(Sha256, u64, Vec<u8>), StorageError> = async {
            let mut temp_file = fs::File::create(&temp_path).await?;
            let mut hasher = Sha256::new();
            let mut total_bytes: u64 = 0;
            let mut prefix = Vec::with_capacity(SNIFF_LEN);
            let mut buf = vec![0u8; CHUNK_SIZE];

            loop {
                let n = reader.read(&mut buf).await?;
                if n == 0 {
                    break;
                }

                total_bytes += n as u64;
                if total_bytes > self.max_size {
                    return Err(StorageError::SizeLimitExceeded {
                        actual: total_bytes,
                        limit: self.max_size,
                    });
                }

                if prefix.len() < SNIFF_LEN {
                    let take = n.min(SNIFF_LEN - prefix.len());
                    prefix.extend_from_slice(&buf[..take]);
                }

                hasher.update(&buf[..n]);
                temp_file.write_all(&buf[..n]).await?;
            }

            temp_file.flush().await?;
            Ok((hasher, total_bytes, prefix))
        }
        .await;

        match result {
            Ok((hasher, size, prefix)) => Ok(SpooledFile {
                path: temp_path,
                hash: ContentHash::from_hasher(hasher),
                size,
                mime_type: sniff_mime_type(&prefix),
            }),
            Err(e) => {
                // Best effort.
                let _ = fs::remove_file(&temp_path).await;
                Err(e)
            }
        }
    }

    async fn materialize(
        &self,
        spooled: &SpooledFile,
        collection: FileCollection,
        filename: &str,
    ) -> Result<(), StorageError> {
        let dest = self.file_path(collection, filename)?;
        fs::create_dir_all(self.collection_dir(collection)).await?;

        match fs::hard_link(&spooled.path, &dest).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists(filename.to_string()))
            }
            Err(e) => {
                debug!(error = %e, "Hard link failed, copying spooled file instead");
                self.copy_new(&spooled.path, &dest, filename).await
            }
        }
    }

    async fn open(
        &self,
        collection: FileCollection,
        filename: &str,
    ) -> Result<(BoxReader, u64), StorageError> {
        let path = self
            .file_path(collection, filename)
            .map_err(|_| StorageError::NotFound(filename.to_string()))?;
        match fs::File::open(&path).await {
            Ok(file) => {
                let len = file.metadata().await?.len();
                Ok((Box::new(BufReader::new(file)), len))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(
        &self,
        collection: FileCollection,
        filename: &str,
    ) -> Result<bool, StorageError> {
        let path = self.file_path(collection, filename)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
