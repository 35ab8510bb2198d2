//! Images in the image intake container, by name.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use axum_macros::debug_handler;
use tracing::{info, warn};

use crate::{api, intake::BlobCreated, AppState};

/// The largest image that can be uploaded, in bytes.
pub const MAX_IMAGE_SIZE: usize = 100 * 1024 * 1024;

/// Uploads an image to the image intake container, which completes the todo item whose ID is the
/// image's name without its extension.
///
/// Image intake runs in the background, so this responds before the todo item is updated.
///
/// # Errors
///
/// See [`crate::api::Error`].
#[debug_handler]
pub async fn put(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<StatusCode, api::Error> {
    info!(%name, size = body.len(), "Uploading image");

    if body.is_empty() {
        return Err(api::Error::ImageEmpty);
    }

    let container = &state.containers.images;

    state
        .blobs
        .write(container, &name, &body)
        .await
        .map_err(|source| api::Error::storage(format!("Error in uploading image {name}"), source))?;

    let event = BlobCreated {
        container: container.clone(),
        name,
    };

    if let Err(error) = state.blob_events.send(event).await {
        warn!(name = %error.0.name, "Image intake isn't running; image won't be processed");
    }

    Ok(StatusCode::OK)
}
