//! Configuration read from environment variables (or a `.env` file).

use std::{env::VarError, path::PathBuf};

/// The default name of the container whose new images complete todo items.
pub const DEFAULT_IMAGES_CONTAINER: &str = "todo-images";

/// The default name of the container images are copied into.
pub const DEFAULT_IMAGES_COPY_CONTAINER: &str = "todo-images-copy";

/// The server's configuration.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Config {
    /// The address the server should listen on (`ADDRESS`).
    pub address: String,

    /// The PostgreSQL connection URL (`DATABASE_URL`). Todo items are kept in memory without it.
    pub database_url: Option<String>,

    /// The directory to keep blobs in (`BLOB_ROOT`). Blobs are kept in memory without it.
    pub blob_root: Option<PathBuf>,

    /// The blob container names.
    pub containers: Containers,
}

/// The names of the blob containers image intake uses.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Containers {
    /// New blobs here trigger image intake (`IMAGES_CONTAINER`).
    pub images: String,

    /// Image intake copies blobs here (`IMAGES_COPY_CONTAINER`).
    pub images_copy: String,
}

impl Default for Containers {
    fn default() -> Self {
        Self {
            images: DEFAULT_IMAGES_CONTAINER.to_owned(),
            images_copy: DEFAULT_IMAGES_COPY_CONTAINER.to_owned(),
        }
    }
}

impl Config {
    /// Reads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Fails if `ADDRESS` isn't set or any variable isn't valid Unicode.
    pub fn from_env() -> Result<Self, dotenvy::Error> {
        let defaults = Containers::default();

        Ok(Self {
            address: dotenvy::var("ADDRESS")?,
            database_url: optional_var("DATABASE_URL")?,
            blob_root: optional_var("BLOB_ROOT")?.map(PathBuf::from),
            containers: Containers {
                images: optional_var("IMAGES_CONTAINER")?.unwrap_or(defaults.images),
                images_copy: optional_var("IMAGES_COPY_CONTAINER")?
                    .unwrap_or(defaults.images_copy),
            },
        })
    }
}

/// Gets an environment variable, returning `None` if it isn't set or is empty.
fn optional_var(key: &str) -> Result<Option<String>, dotenvy::Error> {
    match dotenvy::var(key) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(None),
        Err(error) => Err(error),
    }
}
