use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use swaparoony_core::shared::error::FaceSwapError;

use crate::wire::ErrorResponse;

/// Request failure as seen by HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or missing request fields.
    Unprocessable(String),
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
    Service(FaceSwapError),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Service(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Service(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        let (error, detail) = match self {
            ApiError::Service(e) => (e.to_string(), Some(e.kind().to_string())),
            ApiError::Unprocessable(m)
            | ApiError::BadRequest(m)
            | ApiError::NotFound(m)
            | ApiError::Unavailable(m)
            | ApiError::Internal(m) => (m.clone(), None),
        };
        ErrorResponse {
            success: false,
            error,
            detail,
        }
    }
}

impl From<FaceSwapError> for ApiError {
    fn from(e: FaceSwapError) -> Self {
        ApiError::Service(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self.body().error);
        }
        (status, Json(self.body())).into_response()
    }
}
