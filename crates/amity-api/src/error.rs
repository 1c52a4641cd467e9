use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use amity_core::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Maps domain errors onto HTTP responses with the user-facing
/// `{"message": ...}` body. Storage faults become an opaque 500.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// For join errors and other faults outside the domain taxonomy.
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self(Error::Storage(err.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Forbidden | Error::Blocked => StatusCode::FORBIDDEN,
            Error::DuplicateRequest
            | Error::AlreadyFriends
            | Error::CooldownActive
            | Error::AlreadyBlocked
            | Error::NotBlocked
            | Error::InvalidTransition(_)
            | Error::RateLimited { .. } => StatusCode::BAD_REQUEST,
            Error::Storage(err) => {
                error!("storage fault: {err:#}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error" })),
                )
                    .into_response();
            }
        };
        (status, Json(json!({ "message": self.0.to_string() }))).into_response()
    }
}
