use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogError;

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl CatalogError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            CatalogError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            CatalogError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            CatalogError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            CatalogError::InternalInconsistency(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_inconsistency")
            }
            CatalogError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = ErrorBody {
            error: code.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
