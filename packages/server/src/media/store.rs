use blog_common::storage::filename::{FilenameCandidates, MAX_FILENAME_LENGTH};
use blog_common::storage::{ContentHash, FileCollection, MediaStore, SpooledFile, StorageError};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use crate::entity::stored_file;
use crate::models::shared::escape_like;

#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("No free filename for '{filename}' after {attempts} numbered attempts")]
    ResourceExhausted { filename: String, attempts: u32 },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Persistence(#[from] DbErr),
}

/// Content-addressed file storage: bytes on a [`MediaStore`], one
/// `stored_file` row per distinct content hash.
pub struct FileStore<'a, C> {
    db: &'a C,
    media: &'a dyn MediaStore,
    max_suffix: u32,
}

impl<'a, C: ConnectionTrait> FileStore<'a, C> {
    pub fn new(db: &'a C, media: &'a dyn MediaStore, max_suffix: u32) -> Self {
        Self {
            db,
            media,
            max_suffix,
        }
    }

    /// Stream an upload into `collection`.
    ///
    /// Returns the stored row and whether it was created by this call. Content
    /// that is already stored returns the existing row, whatever its name.
    pub async fn store(
        &self,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        original_filename: Option<&str>,
        collection: FileCollection,
    ) -> Result<(stored_file::Model, bool), FileStoreError> {
        let original_filename = original_filename
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| FileStoreError::InvalidInput("Uploaded file has no filename".into()))?;

        let spooled = self.media.spool(reader).await?;
        self.commit(&spooled, original_filename, collection).await
    }

    /// Persist an already spooled upload. See [`FileStore::store`].
    pub async fn commit(
        &self,
        spooled: &SpooledFile,
        original_filename: &str,
        collection: FileCollection,
    ) -> Result<(stored_file::Model, bool), FileStoreError> {
        if let Some(existing) = find_by_hash(self.db, &spooled.hash).await? {
            info!(
                file_id = existing.id,
                filename = %existing.filename,
                "Upload matched stored content"
            );
            return Ok((existing, false));
        }

        let content_size = i64::try_from(spooled.size)
            .map_err(|_| FileStoreError::InvalidInput("File is too large".into()))?;
        let candidates = FilenameCandidates::new(original_filename, MAX_FILENAME_LENGTH, self.max_suffix)
            .map_err(|e| FileStoreError::InvalidInput(e.to_string()))?;
        let filename = self.place(spooled, collection, candidates).await?;

        let now = chrono::Utc::now();
        let new_file = stored_file::ActiveModel {
            filename: Set(filename.clone()),
            collection: Set(collection.as_str().to_string()),
            mimetype: Set(spooled.mime_type.to_string()),
            content_size: Set(content_size),
            content_hash: Set(spooled.hash.to_hex()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match new_file.insert(self.db).await {
            Ok(file) => {
                info!(
                    file_id = file.id,
                    filename = %file.filename,
                    size = file.content_size,
                    mimetype = %file.mimetype,
                    "Stored new file"
                );
                Ok((file, true))
            }
            Err(err) => {
                self.discard(collection, &filename).await;
                if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err()
                    && let Some(existing) = find_by_hash(self.db, &spooled.hash).await?
                {
                    info!(
                        file_id = existing.id,
                        "Concurrent upload stored the same content first"
                    );
                    return Ok((existing, false));
                }
                Err(err.into())
            }
        }
    }

    /// Write the spooled bytes under the first free candidate name.
    async fn place(
        &self,
        spooled: &SpooledFile,
        collection: FileCollection,
        candidates: FilenameCandidates,
    ) -> Result<String, FileStoreError> {
        let attempts = candidates.max_suffix();
        let mut first = None;

        for (attempt, candidate) in candidates.enumerate() {
            if first.is_none() {
                first = Some(candidate.clone());
            }
            if file_exists(self.db, collection, &candidate).await? {
                continue;
            }
            match self.media.materialize(spooled, collection, &candidate).await {
                Ok(()) => {
                    if attempt > 0 {
                        debug!(filename = %candidate, attempt, "Filename taken, used numbered variant");
                    }
                    return Ok(candidate);
                }
                Err(StorageError::AlreadyExists(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(FileStoreError::ResourceExhausted {
            filename: first.unwrap_or_default(),
            attempts,
        })
    }

    /// Remove bytes written for a row that could not be inserted.
    async fn discard(&self, collection: FileCollection, filename: &str) {
        match self.media.remove(collection, filename).await {
            Ok(_) => warn!(%collection, filename, "Removed file after failed insert"),
            Err(e) => warn!(%collection, filename, error = %e, "Could not remove file after failed insert"),
        }
    }
}

pub async fn find_by_hash<C: ConnectionTrait>(
    db: &C,
    hash: &ContentHash,
) -> Result<Option<stored_file::Model>, DbErr> {
    stored_file::Entity::find()
        .filter(stored_file::Column::ContentHash.eq(hash.to_hex()))
        .one(db)
        .await
}

/// Whether `filename` is taken in `collection`, ignoring case.
pub async fn file_exists<C: ConnectionTrait>(
    db: &C,
    collection: FileCollection,
    filename: &str,
) -> Result<bool, DbErr> {
    let pattern = escape_like(&filename.to_lowercase());
    let count = stored_file::Entity::find()
        .filter(stored_file::Column::Collection.eq(collection.as_str()))
        .filter(
            Expr::expr(Func::lower(Expr::col(stored_file::Column::Filename)))
                .like(LikeExpr::new(pattern).escape('\\')),
        )
        .count(db)
        .await?;
    Ok(count > 0)
}
