//! API response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `ApiError`: single place where core errors become HTTP statuses
//! - `error_codes`: Standard error code constants

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::Error;

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;
    pub const FORBIDDEN: i32 = 2003;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4091;
    pub const WINDOW_EXPIRED: i32 = 4100;
    pub const INVALID_TRANSITION: i32 = 4221;
    pub const NO_FEE_BAND: i32 = 4222;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
}

/// Core error carried out of a handler. The `IntoResponse` impl below is
/// the only spot where domain failures map to HTTP statuses.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, msg) = match &self.0 {
            Error::NotFound(_) => (
                StatusCode::NOT_FOUND,
                error_codes::NOT_FOUND,
                self.0.to_string(),
            ),
            Error::Conflict(_) => (
                StatusCode::CONFLICT,
                error_codes::CONFLICT,
                self.0.to_string(),
            ),
            Error::InvalidTransition { .. } => (
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_TRANSITION,
                self.0.to_string(),
            ),
            Error::Validation(_) => (
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_PARAMETER,
                self.0.to_string(),
            ),
            Error::WindowExpired => (
                StatusCode::BAD_REQUEST,
                error_codes::WINDOW_EXPIRED,
                self.0.to_string(),
            ),
            Error::NoBandMatch { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                error_codes::NO_FEE_BAND,
                self.0.to_string(),
            ),
            Error::Unauthorized(_) => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTH_FAILED,
                self.0.to_string(),
            ),
            Error::Forbidden(_) => (
                StatusCode::FORBIDDEN,
                error_codes::FORBIDDEN,
                self.0.to_string(),
            ),
            Error::Store(e) => {
                tracing::error!(error = %e, "Store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_codes::INTERNAL_ERROR,
                    "internal error".to_string(),
                )
            }
        };

        (status, Json(ApiResponse::<()>::error(code, msg))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let resp = ApiResponse::success(42);
        assert_eq!(resp.code, 0);
        assert_eq!(resp.msg, "ok");
        assert_eq!(resp.data, Some(42));
    }

    #[test]
    fn test_error_status_mapping() {
        let resp = ApiError(Error::not_found("transaction x")).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = ApiError(Error::WindowExpired).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError(Error::validation("bad amount")).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_state_machine_rejections_are_bad_request() {
        use crate::transaction::TransactionStatus;

        let resp = ApiError(Error::InvalidTransition {
            from: TransactionStatus::Completed,
            to: TransactionStatus::Cancelled,
            allowed: vec![],
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
