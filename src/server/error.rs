//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::StarTypeError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Comparison error: {0}")]
    Comparison(#[from] StarTypeError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred".to_string())
            }
            ServerError::Comparison(e) if e.is_client_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            ServerError::Comparison(e @ StarTypeError::HyperparameterSearch(_)) => {
                tracing::warn!(detail = %e, "Hyperparameter search found no viable model");
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            ServerError::Comparison(e) => {
                tracing::error!(detail = %e, "Comparison error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Comparison failed. Check server logs for details.".to_string())
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let bad = ServerError::from(StarTypeError::MalformedInput("x".to_string())).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let search = ServerError::from(StarTypeError::HyperparameterSearch("x".to_string())).into_response();
        assert_eq!(search.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let internal = ServerError::from(StarTypeError::ComputationError("x".to_string())).into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
