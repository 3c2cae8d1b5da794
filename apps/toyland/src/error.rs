use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use toy_store::StoreError;
use tracing::{error, warn};

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Request body is not a JSON object, or the query string does not parse.
    #[error("invalid request: {0}")]
    InvalidBody(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::InvalidIdentifier { .. })
            | ApiError::Store(StoreError::InvalidSort { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::Unavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Store(StoreError::Backend { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used as the metrics outcome.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidBody(_) => "invalid_body",
            ApiError::Store(StoreError::InvalidIdentifier { .. }) => "invalid_identifier",
            ApiError::Store(StoreError::InvalidSort { .. }) => "invalid_sort",
            ApiError::Store(StoreError::Unavailable { .. }) => "store_unavailable",
            ApiError::Store(StoreError::Backend { .. }) => "store_error",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, "Rejected request");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
