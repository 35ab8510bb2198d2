//! A todo list backend: an HTTP API over a table of todo items, and image intake that completes a
//! todo item when an image named after it is uploaded.

pub mod api;
pub mod config;
pub mod id;
pub mod intake;
pub mod storage;
pub mod todo;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    config::Containers,
    intake::{BlobCreated, ImageIntake},
    storage::{BlobStore, TableStore},
};

/// How many blob-created events can wait for image intake before uploads wait too.
const BLOB_EVENT_BUFFER: usize = 64;

/// The state shared by every API route handler.
#[derive(Clone, Debug)]
pub struct AppState {
    /// The todo item table.
    pub table: Arc<dyn TableStore>,

    /// The image blob store.
    pub blobs: Arc<dyn BlobStore>,

    /// The blob container names.
    pub containers: Arc<Containers>,

    /// Sends blob-created events to image intake.
    pub blob_events: mpsc::Sender<BlobCreated>,
}

impl AppState {
    /// Constructs the state and spawns image intake onto the current Tokio runtime. Image intake
    /// stops once every clone of the state is dropped.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(
        table: Arc<dyn TableStore>,
        blobs: Arc<dyn BlobStore>,
        containers: Containers,
    ) -> Self {
        let containers = Arc::new(containers);
        let (blob_events, receiver) = mpsc::channel(BLOB_EVENT_BUFFER);

        let state = Self {
            table,
            blobs,
            containers,
            blob_events,
        };

        tokio::spawn(state.image_intake().run(receiver));

        state
    }

    /// Constructs an image intake handler over the same storage as this state.
    pub fn image_intake(&self) -> ImageIntake {
        ImageIntake::new(
            Arc::clone(&self.table),
            Arc::clone(&self.blobs),
            Arc::clone(&self.containers),
        )
    }
}
