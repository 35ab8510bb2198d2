//! The set of todo items, and todo items by ID.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use axum_macros::debug_handler;
use serde::Deserialize;
use tracing::info;

use crate::{
    api::{self, validation::TaskDescription, Json, Response},
    id::NewTodoId,
    storage::{ETagMatch, StorageError},
    todo::{Todo, TodoEntity, TodoUpdate, PARTITION_KEY},
    AppState,
};

/// A `POST` request body for this API route.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    /// What needs doing.
    pub task_description: TaskDescription,
}

/// Creates a new, incomplete todo item with a generated ID.
///
/// # Errors
///
/// See [`crate::api::Error`].
#[debug_handler]
pub async fn post(State(state): State<AppState>, Json(body): Json<PostRequest>) -> Response<Todo> {
    info!("Creating a new todo item");

    let mut entity = TodoEntity::new(
        NewTodoId::generate().to_string(),
        body.task_description.into_inner(),
    );

    let etag = loop {
        match state.table.insert(&entity).await {
            Err(StorageError::Conflict) => entity.row_key = NewTodoId::generate().to_string(),
            result => break result,
        }
    }
    .map_err(|source| api::Error::storage("Error in creating todo item", source))?;
    entity.etag = Some(etag);

    Ok((StatusCode::OK, Json(entity.into())))
}

/// Lists every todo item.
///
/// # Errors
///
/// See [`crate::api::Error`].
#[debug_handler]
pub async fn list(State(state): State<AppState>) -> Response<Vec<Todo>> {
    info!("Getting todo items");

    let entities = state
        .table
        .query_all()
        .await
        .map_err(|source| api::Error::storage("Error in getting todo items", source))?;

    Ok((
        StatusCode::OK,
        Json(entities.into_iter().map(Todo::from).collect()),
    ))
}

/// Gets a todo item by its ID.
///
/// # Errors
///
/// See [`crate::api::Error`].
#[debug_handler]
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Response<Todo> {
    info!(%id, "Getting todo item");

    let Some(entity) = state
        .table
        .retrieve(PARTITION_KEY, &id)
        .await
        .map_err(|source| api::Error::storage(format!("Error in getting todo item {id}"), source))?
    else {
        info!(%id, "Todo item not found");
        return Err(api::Error::ResourceNotFound);
    };

    Ok((StatusCode::OK, Json(entity.into())))
}

/// A `PUT` request body for this API route.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PutRequest {
    /// The new description. Omitted or empty keeps the current one.
    #[serde(default)]
    pub task_description: Option<String>,

    /// The new completion flag. Omitted means `false`.
    #[serde(default)]
    pub is_completed: bool,
}

impl From<PutRequest> for TodoUpdate {
    fn from(body: PutRequest) -> Self {
        Self {
            task_description: body.task_description,
            is_completed: body.is_completed,
        }
    }
}

/// Updates a todo item. See [`TodoEntity::apply`] for how the request body is merged.
///
/// The stored item is replaced whatever its version, so the last of concurrent updates wins.
///
/// # Errors
///
/// See [`crate::api::Error`].
#[debug_handler]
pub async fn put(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PutRequest>,
) -> Response<Todo> {
    info!(%id, "Updating todo item");

    let storage_error =
        |source| api::Error::storage(format!("Error in updating todo item {id}"), source);

    let Some(mut entity) = state
        .table
        .retrieve(PARTITION_KEY, &id)
        .await
        .map_err(storage_error)?
    else {
        info!(%id, "Todo item not found");
        return Err(api::Error::ResourceNotFound);
    };

    entity.apply(body.into());

    let etag = state
        .table
        .replace(&entity, &ETagMatch::Any)
        .await
        .map_err(storage_error)?;
    entity.etag = Some(etag);

    Ok((StatusCode::OK, Json(entity.into())))
}

/// Deletes a todo item whatever its version.
///
/// # Errors
///
/// Returns [`api::Error::ResourceNotFound`] if the todo item doesn't exist. Any other storage
/// failure is unhandled and becomes [`api::Error::Internal`].
#[debug_handler]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, api::Error> {
    info!(%id, "Deleting todo item");

    match state
        .table
        .delete(PARTITION_KEY, &id, &ETagMatch::Any)
        .await
    {
        Ok(()) => Ok(StatusCode::OK),
        Err(StorageError::NotFound) => {
            info!(%id, "Todo item not found");
            Err(api::Error::ResourceNotFound)
        }
        Err(error) => Err(api::Error::Internal(error)),
    }
}
