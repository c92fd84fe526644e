//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use glim_core::error::{AppError, ErrorKind};

use crate::dto::response::MessageResponse;

/// HTTP rendering of an [`AppError`].
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Status code for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::BadRequest | ErrorKind::AlreadyExists => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized
        | ErrorKind::InvalidToken
        | ErrorKind::TokenRevoked
        | ErrorKind::RefreshWindowExceeded
        | ErrorKind::InvalidSubject => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Validation | ErrorKind::MalformedToken => StatusCode::NOT_ACCEPTABLE,
        ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal | ErrorKind::Database | ErrorKind::Session | ErrorKind::Configuration => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(err.kind);

        let message = if err.kind.is_internal() {
            tracing::error!(kind = %err.kind, error = %err.message, source = ?err.source, "Internal server error");
            "internal server error".to_string()
        } else {
            err.message
        };

        (status, Json(MessageResponse { message })).into_response()
    }
}
