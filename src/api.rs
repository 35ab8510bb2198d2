//! The HTTP API. Every route is served under `/api/`.

pub mod routes;
pub mod validation;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    Router,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::error;

use crate::{storage::StorageError, AppState};

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    routes::router().with_state(state)
}

/// The result of an API route handler with a JSON response body.
pub type Response<T> = Result<(StatusCode, Json<T>), Error>;

/// An API error. Responds with its status code and a `text/plain` body of its message.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The request body was empty.
    #[error("Todo object is empty")]
    BodyEmpty,

    /// An uploaded image was empty.
    #[error("Image is empty")]
    ImageEmpty,

    /// The request body couldn't be read or isn't valid for this route.
    #[error("Invalid request body: {0}")]
    BodyInvalid(String),

    /// The requested resource doesn't exist.
    #[error("Not Found")]
    ResourceNotFound,

    /// The requested API route doesn't exist.
    #[error("Not Found")]
    RouteNotFound,

    /// A storage operation failed in a way the route handler expects.
    #[error("{message}")]
    Storage {
        /// What the route handler was doing.
        message: String,

        /// The storage error.
        #[source]
        source: StorageError,
    },

    /// A storage operation failed in a way the route handler doesn't handle.
    #[error("Internal Server Error")]
    Internal(#[source] StorageError),
}

impl Error {
    /// Constructs an [`Error::Storage`].
    pub fn storage(message: impl Into<String>, source: StorageError) -> Self {
        Self::Storage {
            message: message.into(),
            source,
        }
    }

    /// Gets the response status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BodyEmpty | Self::ImageEmpty | Self::BodyInvalid(_) | Self::Storage { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::ResourceNotFound | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match &self {
            Self::Storage { message, source } => error!(error = %source, "{message}"),
            Self::Internal(source) => error!(error = %source, "unhandled storage error"),
            _ => {}
        }

        (
            self.status(),
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

/// A JSON request or response body.
///
/// As an extractor, an empty body is rejected with [`Error::BodyEmpty`] and an invalid one with
/// [`Error::BodyInvalid`]. The `Content-Type` header isn't checked.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Json<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|rejection| Error::BodyInvalid(rejection.body_text()))?;

        if bytes.is_empty() {
            return Err(Error::BodyEmpty);
        }

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|error| Error::BodyInvalid(error.to_string()))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self.0).into_response()
    }
}
