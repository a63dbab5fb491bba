//! Error types (relay-api)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// relay-api error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Core(#[from] relay_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_is_internal() {
        let core = ApiError::from(relay_core::Error::ModelApi("401: bad key".to_string()));
        assert_eq!(core.to_string(), "Model API error: 401: bad key");
        assert_eq!(core.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let io = ApiError::from(std::io::Error::other("boom"));
        assert_eq!(io.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
