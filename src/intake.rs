//! Image intake: completing todo items when images named after them are uploaded.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::{
    config::Containers,
    storage::{BlobStore, ETagMatch, StorageResult, TableStore},
    todo::PARTITION_KEY,
};

/// A notification that a blob was created.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct BlobCreated {
    /// The container the blob was created in.
    pub container: String,

    /// The blob's name.
    pub name: String,
}

/// Reacts to new blobs in the image intake container.
#[derive(Clone, Debug)]
pub struct ImageIntake {
    /// The todo item table.
    table: Arc<dyn TableStore>,

    /// Where the images are.
    blobs: Arc<dyn BlobStore>,

    /// Which containers to read from and copy to.
    containers: Arc<Containers>,
}

impl ImageIntake {
    /// Constructs an image intake handler.
    pub fn new(
        table: Arc<dyn TableStore>,
        blobs: Arc<dyn BlobStore>,
        containers: Arc<Containers>,
    ) -> Self {
        Self {
            table,
            blobs,
            containers,
        }
    }

    /// Handles blob-created events one at a time until every sender is dropped. Events from
    /// containers other than the image intake container are ignored.
    pub async fn run(self, mut events: mpsc::Receiver<BlobCreated>) {
        while let Some(event) = events.recv().await {
            if event.container == self.containers.images {
                self.handle(&event.name).await;
            }
        }

        info!("Image intake stopped");
    }

    /// Handles a new image in the image intake container.
    ///
    /// If a todo item's ID is the image's name without its extension, the todo item is completed
    /// and the image is copied to the copy container. Otherwise, nothing happens. Storage failures
    /// are logged and dropped, since there's nobody to report them to.
    pub async fn handle(&self, name: &str) {
        info!(%name, "Processing new image");

        let id = todo_id_from_image_name(name);

        if let Err(error) = self.complete_and_copy(name, id).await {
            error!(%id, %error, "Error in updating todo item from image");
        }
    }

    /// Completes the todo item and copies the image, or does nothing if the todo item doesn't
    /// exist.
    async fn complete_and_copy(&self, name: &str, id: &str) -> StorageResult<()> {
        let Some(mut entity) = self.table.retrieve(PARTITION_KEY, id).await? else {
            info!(%id, "Todo item not found");
            return Ok(());
        };

        entity.is_completed = true;
        self.table.replace(&entity, &ETagMatch::Any).await?;

        let bytes = self.blobs.read(&self.containers.images, name).await?;
        self.blobs
            .write(&self.containers.images_copy, name, &bytes)
            .await?;

        info!(%id, "Todo item completed and image copied");

        Ok(())
    }
}

/// Gets the ID of the todo item an image is for: the image's file name without its extension.
pub fn todo_id_from_image_name(name: &str) -> &str {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);

    match file_name.rfind('.') {
        Some(dot_index) => &file_name[..dot_index],
        None => file_name,
    }
}
