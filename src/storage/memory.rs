//! In-memory storage backends, used when no database or blob directory is configured and in tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    storage::{
        validate_blob_name, BlobStore, ETag, ETagMatch, StorageError, StorageResult, TableStore,
    },
    todo::TodoEntity,
};

/// A [`TableStore`] kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryTable {
    /// The table's contents.
    state: RwLock<MemoryTableState>,
}

/// See [`MemoryTable`].
#[derive(Debug, Default)]
struct MemoryTableState {
    /// Entities keyed by partition key and row key. Each stored entity's `etag` is set.
    entities: BTreeMap<(String, String), TodoEntity>,

    /// The last version number handed out.
    version: u64,
}

impl MemoryTableState {
    /// Hands out a fresh version token.
    fn next_etag(&mut self) -> ETag {
        self.version += 1;
        ETag::new(self.version.to_string())
    }
}

impl MemoryTable {
    /// Constructs an empty table.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Builds the map key for an entity.
fn key(partition_key: &str, row_key: &str) -> (String, String) {
    (partition_key.to_owned(), row_key.to_owned())
}

/// Checks `condition` against a stored entity's version token.
fn check_condition(stored: &TodoEntity, condition: &ETagMatch) -> StorageResult<()> {
    match &stored.etag {
        Some(current) if !condition.matches(current) => Err(StorageError::PreconditionFailed),
        _ => Ok(()),
    }
}

#[async_trait]
impl TableStore for MemoryTable {
    async fn insert(&self, entity: &TodoEntity) -> StorageResult<ETag> {
        let mut state = self.state.write().await;
        let key = key(&entity.partition_key, &entity.row_key);

        if state.entities.contains_key(&key) {
            return Err(StorageError::Conflict);
        }

        let etag = state.next_etag();
        state.entities.insert(
            key,
            TodoEntity {
                etag: Some(etag.clone()),
                ..entity.clone()
            },
        );

        Ok(etag)
    }

    async fn query_all(&self) -> StorageResult<Vec<TodoEntity>> {
        Ok(self.state.read().await.entities.values().cloned().collect())
    }

    async fn retrieve(
        &self,
        partition_key: &str,
        row_key: &str,
    ) -> StorageResult<Option<TodoEntity>> {
        Ok(self
            .state
            .read()
            .await
            .entities
            .get(&key(partition_key, row_key))
            .cloned())
    }

    async fn replace(&self, entity: &TodoEntity, condition: &ETagMatch) -> StorageResult<ETag> {
        let mut state = self.state.write().await;
        let key = key(&entity.partition_key, &entity.row_key);

        let Some(stored) = state.entities.get(&key) else {
            return Err(StorageError::NotFound);
        };
        check_condition(stored, condition)?;

        let etag = state.next_etag();
        state.entities.insert(
            key,
            TodoEntity {
                etag: Some(etag.clone()),
                ..entity.clone()
            },
        );

        Ok(etag)
    }

    async fn delete(
        &self,
        partition_key: &str,
        row_key: &str,
        condition: &ETagMatch,
    ) -> StorageResult<()> {
        let mut state = self.state.write().await;
        let key = key(partition_key, row_key);

        let Some(stored) = state.entities.get(&key) else {
            return Err(StorageError::NotFound);
        };
        check_condition(stored, condition)?;

        state.entities.remove(&key);

        Ok(())
    }
}

/// A [`BlobStore`] kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    /// Blob contents keyed by container and name.
    blobs: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Constructs an empty blob store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, container: &str, name: &str) -> StorageResult<Vec<u8>> {
        validate_blob_name(container)?;
        validate_blob_name(name)?;

        self.blobs
            .read()
            .await
            .get(&key(container, name))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn write(&self, container: &str, name: &str, bytes: &[u8]) -> StorageResult<()> {
        validate_blob_name(container)?;
        validate_blob_name(name)?;

        self.blobs
            .write()
            .await
            .insert(key(container, name), bytes.to_vec());

        Ok(())
    }
}
