//! HTTP error mapping
//!
//! Ranking core errors become status codes here: duplicate ids are 409,
//! unknown players in a match report are 422, malformed input is 400.

use crate::error::RankerError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

/// Error returned by API handlers
#[derive(Debug)]
pub enum ApiError {
    /// Failure reported by the ranking core
    Ranker(RankerError),
    /// Request body could not be read as the expected JSON shape
    BadRequest(String),
    /// Requested resource does not exist
    NotFound(String),
}

/// JSON error body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ranker(RankerError::DuplicatePlayer { .. }) => StatusCode::CONFLICT,
            ApiError::Ranker(RankerError::PlayerNotFound { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Ranker(RankerError::InvalidInput { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Ranker(RankerError::Storage { .. })
            | ApiError::Ranker(RankerError::Internal { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Ranker(e) => e.to_string(),
            ApiError::BadRequest(message) | ApiError::NotFound(message) => message.clone(),
        }
    }
}

impl From<RankerError> for ApiError {
    fn from(error: RankerError) -> Self {
        ApiError::Ranker(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            error!("Request failed with {}: {}", status, message);
        } else {
            warn!("Request rejected with {}: {}", status, message);
        }

        let body = ErrorBody {
            status_code: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
