//! A table store backed by PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use tracing::info;

use crate::{
    storage::{ETag, ETagMatch, StorageError, StorageResult, TableStore},
    todo::TodoEntity,
};

/// The name of the `todos` table's primary key constraint.
const TODOS_PKEY: &str = "todos_pkey";

/// A [`TableStore`] using the `todos` table of a PostgreSQL database.
///
/// Each row's `version` column is its version token, incremented on every write.
#[derive(Clone, Debug)]
pub struct PgTable {
    /// The SQLx database pool.
    pool: PgPool,
}

impl PgTable {
    /// Connects to the database and runs pending database migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial database connection or its migrations fail.
    pub async fn connect(db_url: &str) -> StorageResult<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new().connect(db_url).await?;

        info!("Migrating database...");

        sqlx::migrate!().run(&pool).await?;

        Ok(Self { pool })
    }

    /// Tells apart a missing row from a version mismatch after a conditional write matched
    /// nothing.
    async fn missed_write_error(&self, partition_key: &str, row_key: &str) -> StorageError {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM todos WHERE partition_key = $1 AND row_key = $2)",
        )
        .bind(partition_key)
        .bind(row_key)
        .fetch_one(&self.pool)
        .await;

        match exists {
            Ok(true) => StorageError::PreconditionFailed,
            Ok(false) => StorageError::NotFound,
            Err(error) => error.into(),
        }
    }
}

/// A row of the `todos` table.
#[derive(FromRow, Debug)]
struct TodoRow {
    /// See [`TodoEntity::partition_key`].
    partition_key: String,

    /// See [`TodoEntity::row_key`].
    row_key: String,

    /// The row's version number.
    version: i64,

    /// See [`TodoEntity::created_time`].
    created_time: DateTime<Utc>,

    /// See [`TodoEntity::task_description`].
    task_description: String,

    /// See [`TodoEntity::is_completed`].
    is_completed: bool,
}

impl From<TodoRow> for TodoEntity {
    fn from(row: TodoRow) -> Self {
        Self {
            partition_key: row.partition_key,
            row_key: row.row_key,
            etag: Some(ETag::new(row.version.to_string())),
            created_time: row.created_time,
            task_description: row.task_description,
            is_completed: row.is_completed,
        }
    }
}

/// Converts a write condition to the version number it requires, if any.
///
/// A token that isn't a version number can't match any row, so it's rejected up front.
fn required_version(condition: &ETagMatch) -> StorageResult<Option<i64>> {
    match condition {
        ETagMatch::Any => Ok(None),
        ETagMatch::Exact(etag) => etag
            .as_str()
            .parse()
            .map(Some)
            .map_err(|_| StorageError::PreconditionFailed),
    }
}

#[async_trait]
impl TableStore for PgTable {
    async fn insert(&self, entity: &TodoEntity) -> StorageResult<ETag> {
        let result = sqlx::query_scalar::<_, i64>(
            "INSERT INTO todos
                    (partition_key, row_key, created_time, task_description, is_completed)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING version",
        )
        .bind(&entity.partition_key)
        .bind(&entity.row_key)
        .bind(entity.created_time)
        .bind(&entity.task_description)
        .bind(entity.is_completed)
        .fetch_one(&self.pool)
        .await;

        match result {
            Err(sqlx::Error::Database(error)) if error.constraint() == Some(TODOS_PKEY) => {
                Err(StorageError::Conflict)
            }
            result => Ok(ETag::new(result?.to_string())),
        }
    }

    async fn query_all(&self) -> StorageResult<Vec<TodoEntity>> {
        let rows = sqlx::query_as::<_, TodoRow>(
            "SELECT partition_key, row_key, version, created_time, task_description, is_completed
                FROM todos
                ORDER BY partition_key, row_key",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TodoEntity::from).collect())
    }

    async fn retrieve(
        &self,
        partition_key: &str,
        row_key: &str,
    ) -> StorageResult<Option<TodoEntity>> {
        let row = sqlx::query_as::<_, TodoRow>(
            "SELECT partition_key, row_key, version, created_time, task_description, is_completed
                FROM todos
                WHERE partition_key = $1 AND row_key = $2",
        )
        .bind(partition_key)
        .bind(row_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TodoEntity::from))
    }

    async fn replace(&self, entity: &TodoEntity, condition: &ETagMatch) -> StorageResult<ETag> {
        let version = required_version(condition)?;

        let new_version = sqlx::query_scalar::<_, i64>(
            "UPDATE todos
                SET created_time = $3, task_description = $4, is_completed = $5,
                    version = version + 1
                WHERE partition_key = $1 AND row_key = $2
                    AND ($6::BIGINT IS NULL OR version = $6)
                RETURNING version",
        )
        .bind(&entity.partition_key)
        .bind(&entity.row_key)
        .bind(entity.created_time)
        .bind(&entity.task_description)
        .bind(entity.is_completed)
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;

        match new_version {
            Some(new_version) => Ok(ETag::new(new_version.to_string())),
            None => Err(self
                .missed_write_error(&entity.partition_key, &entity.row_key)
                .await),
        }
    }

    async fn delete(
        &self,
        partition_key: &str,
        row_key: &str,
        condition: &ETagMatch,
    ) -> StorageResult<()> {
        let version = required_version(condition)?;

        let deleted = sqlx::query(
            "DELETE FROM todos
                WHERE partition_key = $1 AND row_key = $2
                    AND ($3::BIGINT IS NULL OR version = $3)",
        )
        .bind(partition_key)
        .bind(row_key)
        .bind(version)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if deleted == 0 {
            return Err(self.missed_write_error(partition_key, row_key).await);
        }

        Ok(())
    }
}
