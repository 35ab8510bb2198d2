//! All routes for the HTTP API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, put},
    Router,
};

use crate::{api, AppState};

pub mod images;
pub mod todo;

/// Builds the API router, still needing its state.
pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/todo", get(todo::list).post(todo::post))
        .route(
            "/api/todo/:id",
            get(todo::get).put(todo::put).delete(todo::delete),
        )
        .route(
            "/api/images/:name",
            put(images::put).layer(DefaultBodyLimit::max(images::MAX_IMAGE_SIZE)),
        )
        .fallback(|| async { api::Error::RouteNotFound })
}
