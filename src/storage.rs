//! Storage ports for todo items and images, and their backends.

pub mod fs;
pub mod memory;
pub mod postgres;

use std::fmt::Debug;

use async_trait::async_trait;
use thiserror::Error;

use crate::todo::TodoEntity;

/// The result of a storage operation.
pub type StorageResult<T> = Result<T, StorageError>;

/// An error from a storage backend.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StorageError {
    /// The addressed entity or blob doesn't exist.
    #[error("resource not found")]
    NotFound,

    /// An entity with the same keys already exists.
    #[error("entity already exists")]
    Conflict,

    /// The entity's current version token doesn't match the one the caller required.
    #[error("entity version token doesn't match")]
    PreconditionFailed,

    /// A blob name can't be used as a storage key.
    #[error("invalid blob name {0:?}")]
    InvalidBlobName(String),

    /// The database failed.
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Database migrations failed.
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// The filesystem failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// An opaque version token the table assigns to an entity on every write.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ETag(String);

impl ETag {
    /// Wraps a backend-specific version value.
    pub(crate) fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Gets the token as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Which version of an entity a replace or delete applies to.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ETagMatch {
    /// Applies to whatever version is stored (`*`).
    Any,

    /// Applies only if the stored version still has this token.
    Exact(ETag),
}

impl ETagMatch {
    /// Returns whether an entity stored with `current` satisfies this condition.
    pub fn matches(&self, current: &ETag) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == current,
        }
    }
}

/// The table of todo items, addressed by partition key and row key.
#[async_trait]
pub trait TableStore: Send + Sync + Debug {
    /// Inserts a new entity, returning its version token.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] if an entity with the same keys exists.
    async fn insert(&self, entity: &TodoEntity) -> StorageResult<ETag>;

    /// Returns every entity in the table in a single unbounded page.
    ///
    /// # Errors
    ///
    /// Fails only if the backend does.
    async fn query_all(&self) -> StorageResult<Vec<TodoEntity>>;

    /// Looks up one entity. Returns `None` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Fails only if the backend does.
    async fn retrieve(&self, partition_key: &str, row_key: &str)
        -> StorageResult<Option<TodoEntity>>;

    /// Overwrites every property of an existing entity, returning its new version token.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the entity doesn't exist, or
    /// [`StorageError::PreconditionFailed`] if `condition` doesn't match its version.
    async fn replace(&self, entity: &TodoEntity, condition: &ETagMatch) -> StorageResult<ETag>;

    /// Deletes an entity.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the entity doesn't exist, or
    /// [`StorageError::PreconditionFailed`] if `condition` doesn't match its version.
    async fn delete(
        &self,
        partition_key: &str,
        row_key: &str,
        condition: &ETagMatch,
    ) -> StorageResult<()>;
}

/// Named containers of binary objects.
#[async_trait]
pub trait BlobStore: Send + Sync + Debug {
    /// Reads the full contents of a blob.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the blob doesn't exist, or
    /// [`StorageError::InvalidBlobName`] if `name` isn't a valid blob name.
    async fn read(&self, container: &str, name: &str) -> StorageResult<Vec<u8>>;

    /// Creates or overwrites a blob.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidBlobName`] if `name` isn't a valid blob name.
    async fn write(&self, container: &str, name: &str, bytes: &[u8]) -> StorageResult<()>;
}

/// Checks that a blob name is a single non-empty path segment.
///
/// # Errors
///
/// Returns [`StorageError::InvalidBlobName`] otherwise.
pub(crate) fn validate_blob_name(name: &str) -> StorageResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\x00']);

    if invalid {
        return Err(StorageError::InvalidBlobName(name.to_owned()));
    }

    Ok(())
}
