//! A blob store backed by a local directory, with one subdirectory per container.

use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::storage::{validate_blob_name, BlobStore, StorageError, StorageResult};

/// A [`BlobStore`] that keeps each blob as a file at `{root}/{container}/{name}`.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    /// The directory containing every container directory.
    root: PathBuf,
}

impl FsBlobStore {
    /// Constructs a blob store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the file path of a blob.
    fn blob_path(&self, container: &str, name: &str) -> StorageResult<PathBuf> {
        validate_blob_name(container)?;
        validate_blob_name(name)?;

        Ok(self.root.join(container).join(name))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn read(&self, container: &str, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.blob_path(container, name)?;

        fs::read(&path).await.map_err(|error| match error.kind() {
            ErrorKind::NotFound => StorageError::NotFound,
            _ => error.into(),
        })
    }

    async fn write(&self, container: &str, name: &str, bytes: &[u8]) -> StorageResult<()> {
        let path = self.blob_path(container, name)?;

        fs::create_dir_all(self.root.join(container)).await?;
        fs::write(&path, bytes).await?;

        Ok(())
    }
}
