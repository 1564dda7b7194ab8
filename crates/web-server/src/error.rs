// In crates/web-server/src/error.rs

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::types::ErrorBody;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Dashboard(#[from] dashboard::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("Failed to bind server address: {0}")]
    ServerBindError(std::io::Error),

    #[error("Server terminated with an error: {0}")]
    ServerError(std::io::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Dashboard(dashboard::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Error::Dashboard(dashboard::Error::DataFetch(e)) if e.is_not_found() => {
                StatusCode::NOT_FOUND
            }
            Error::Dashboard(dashboard::Error::DataFetch(_)) => StatusCode::BAD_GATEWAY,
            Error::Dashboard(dashboard::Error::DataShape(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::ServerBindError(_) | Error::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed.");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
