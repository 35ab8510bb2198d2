//! The todo backend's web server.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use todo_backend::{
    api,
    config::Config,
    storage::{
        fs::FsBlobStore,
        memory::{MemoryBlobStore, MemoryTable},
        postgres::PgTable,
        BlobStore, TableStore,
    },
    AppState,
};

/// # Errors
///
/// See implementation.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let table: Arc<dyn TableStore> = match &config.database_url {
        Some(db_url) => Arc::new(PgTable::connect(db_url).await?),
        None => {
            warn!("`DATABASE_URL` isn't set, so todo items will only be kept in memory");
            Arc::new(MemoryTable::new())
        }
    };

    let blobs: Arc<dyn BlobStore> = match &config.blob_root {
        Some(blob_root) => {
            info!(blob_root = %blob_root.display(), "Storing blobs on disk");
            Arc::new(FsBlobStore::new(blob_root))
        }
        None => {
            warn!("`BLOB_ROOT` isn't set, so images will only be kept in memory");
            Arc::new(MemoryBlobStore::new())
        }
    };

    let state = AppState::new(table, blobs, config.containers);

    info!("Listening to {}...", config.address);

    let listener = TcpListener::bind(&config.address).await?;

    info!("Ready!");

    axum::serve(listener, api::router(state)).await?;

    Ok(())
}
