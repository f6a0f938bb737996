use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// Failure side of every route. Rendered as `{"success": false, "response": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400: rejected before any store write.
    #[error("{0}")]
    BadRequest(String),

    /// 401
    #[error("{0}")]
    Unauthorized(String),

    /// 404, also used when the caller does not own the target.
    #[error("{0}")]
    NotFound(String),

    /// 405, route exists but not for this method.
    #[error("{0}")]
    MethodNotAllowed(String),

    /// 500 for failures outside the store (hashing, serialization).
    #[error("{0}")]
    Internal(String),

    /// 503 from the readiness gate.
    #[error("Service unavailable")]
    ServiceUnavailable,

    /// Store failure echoed verbatim; the status depends on the route.
    #[error("{source}")]
    Store {
        status: StatusCode,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    /// Store error reported as 400.
    pub fn store_rejected(source: StoreError) -> Self {
        ApiError::Store {
            status: StatusCode::BAD_REQUEST,
            source,
        }
    }

    /// Store error reported as 500.
    pub fn store_failed(source: StoreError) -> Self {
        ApiError::Store {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Store { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Store { source, .. } = &self {
            error!(error = %source, %status, "store error");
        }
        let body = json!({
            "success": false,
            "response": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
