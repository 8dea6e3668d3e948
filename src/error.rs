//! Request-level errors and their HTTP mapping.

use crate::conflict::ScheduleConflict;
use crate::store::StoreError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Missing field, out-of-range value or malformed availability. Nothing was written.
    #[error("{0}")]
    Validation(String),
    /// The submission overlaps an existing record. Nothing was written.
    #[error(transparent)]
    Conflict(#[from] ScheduleConflict),
    #[error("{0}")]
    NotFound(String),
    /// Request body could not be decoded, e.g. an unknown day or a period outside u8.
    #[error("Invalid request body: {}", .0.body_text())]
    Body(#[from] JsonRejection),
    #[error("Invalid query string: {}", .0.body_text())]
    Query(#[from] QueryRejection),
    #[error("Invalid path: {}", .0.body_text())]
    Path(#[from] PathRejection),
    /// The store failed; the request is abandoned without retry.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ScheduleError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ScheduleError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, code, details) = match &self {
            ScheduleError::Validation(_)
            | ScheduleError::Body(_)
            | ScheduleError::Query(_)
            | ScheduleError::Path(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", None),
            ScheduleError::Conflict(conflict) => (
                StatusCode::CONFLICT,
                "SCHEDULE_CONFLICT",
                serde_json::to_value(conflict).ok(),
            ),
            ScheduleError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
            ScheduleError::Store(e) => {
                error!("Store failure: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", None)
            }
        };

        (
            status,
            Json(ApiError {
                code,
                message,
                details,
            }),
        )
            .into_response()
    }
}
