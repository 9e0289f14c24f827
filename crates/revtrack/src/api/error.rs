//! API error types

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use revtrack_api::ValidationError;
use revtrack_store::StoreError;
use tracing::error;

/// Cache policy for every resolution answer, errors included
pub const NO_CACHE: &str = "no-cache,no-store,must-revalidate";

/// Errors returned by handlers
///
/// Client errors carry a plain-text reason. Server errors never expose
/// their cause; it is logged instead.
#[derive(Debug)]
pub enum AppError {
    /// 400 with the reason as body
    BadRequest(String),
    /// 500 with an empty body
    Internal(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let no_cache = [(header::CACHE_CONTROL, NO_CACHE)];
        match self {
            Self::BadRequest(reason) => (StatusCode::BAD_REQUEST, no_cache, reason).into_response(),
            Self::Internal(detail) => {
                error!(error = %detail, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, no_cache).into_response()
            }
        }
    }
}
