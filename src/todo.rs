//! Todo items, as stored in the table and as returned by the API.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::ETag;

/// The partition key every todo item is stored under.
pub const PARTITION_KEY: &str = "TODO";

/// A todo item as the table stores it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TodoEntity {
    /// Always [`PARTITION_KEY`].
    pub partition_key: String,

    /// The todo item's ID.
    pub row_key: String,

    /// The version token from the last read or write, if any.
    pub etag: Option<ETag>,

    /// When the todo item was created.
    pub created_time: DateTime<Utc>,

    /// What needs doing.
    pub task_description: String,

    /// Whether it's done.
    pub is_completed: bool,
}

impl TodoEntity {
    /// Constructs a new, incomplete todo item in the [`PARTITION_KEY`] partition.
    ///
    /// The creation time is truncated to microseconds, the precision every table backend keeps.
    pub fn new(id: impl Into<String>, task_description: impl Into<String>) -> Self {
        Self {
            partition_key: PARTITION_KEY.to_owned(),
            row_key: id.into(),
            etag: None,
            created_time: Utc::now().trunc_subsecs(6),
            task_description: task_description.into(),
            is_completed: false,
        }
    }

    /// Merges an update into this todo item.
    ///
    /// `is_completed` is always overwritten. The description is only overwritten by a present,
    /// non-empty value; an omitted or empty description leaves it unchanged.
    pub fn apply(&mut self, update: TodoUpdate) {
        self.is_completed = update.is_completed;

        if let Some(task_description) = update.task_description.filter(|desc| !desc.is_empty()) {
            self.task_description = task_description;
        }
    }
}

/// Changes to make to an existing todo item. See [`TodoEntity::apply`].
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TodoUpdate {
    /// The new description, or `None` to keep the current one.
    pub task_description: Option<String>,

    /// The new completion flag.
    pub is_completed: bool,
}

/// A todo item without storage metadata, as the API returns it.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// The todo item's ID.
    pub id: String,

    /// When the todo item was created.
    pub created_time: DateTime<Utc>,

    /// What needs doing.
    pub task_description: String,

    /// Whether it's done.
    pub is_completed: bool,
}

impl From<TodoEntity> for Todo {
    fn from(entity: TodoEntity) -> Self {
        Self {
            id: entity.row_key,
            created_time: entity.created_time,
            task_description: entity.task_description,
            is_completed: entity.is_completed,
        }
    }
}
