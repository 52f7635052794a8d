//! HTTP error mapping
//!
//! Every handler returns `Result<_, ApiError>`. Ledger errors keep their
//! message and are mapped onto a status code and a stable machine-readable
//! code; the body is always `{"code": ..., "message": ...}`.

use crate::types::LedgerError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    /// Caller identity headers missing or malformed
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn admin_required() -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", "Admin role required")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let (status, code) = match &err {
            LedgerError::InvalidAmount { .. } => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            LedgerError::InvalidStatus { .. } => (StatusCode::BAD_REQUEST, "INVALID_STATUS"),
            LedgerError::InvalidTransition { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_TRANSITION")
            }
            LedgerError::MissingReason { .. } => (StatusCode::BAD_REQUEST, "MISSING_REASON"),
            LedgerError::ParseError { .. } => (StatusCode::BAD_REQUEST, "PARSE_ERROR"),
            LedgerError::InsufficientFunds { .. } => (StatusCode::CONFLICT, "INSUFFICIENT_FUNDS"),
            LedgerError::Immutable { .. } => (StatusCode::CONFLICT, "IMMUTABLE"),
            LedgerError::Duplicate { .. } => (StatusCode::CONFLICT, "DUPLICATE"),
            LedgerError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            LedgerError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            LedgerError::ArithmeticOverflow { .. } | LedgerError::IoError { .. } => {
                error!(error = %err, "internal ledger failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };
        Self::new(status, code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::invalid_amount(LedgerError::invalid_amount(0, "credit"), StatusCode::BAD_REQUEST, "INVALID_AMOUNT")]
    #[case::invalid_status(LedgerError::invalid_status("order", "bogus"), StatusCode::BAD_REQUEST, "INVALID_STATUS")]
    #[case::missing_reason(LedgerError::missing_reason(1), StatusCode::BAD_REQUEST, "MISSING_REASON")]
    #[case::insufficient(LedgerError::insufficient_funds(1, 10, 20), StatusCode::CONFLICT, "INSUFFICIENT_FUNDS")]
    #[case::immutable(LedgerError::immutable("withdrawal", 1, "paid"), StatusCode::CONFLICT, "IMMUTABLE")]
    #[case::forbidden(LedgerError::forbidden(2, "adjust wallets"), StatusCode::FORBIDDEN, "FORBIDDEN")]
    #[case::not_found(LedgerError::not_found("wallet", 3), StatusCode::NOT_FOUND, "NOT_FOUND")]
    #[case::overflow(LedgerError::arithmetic_overflow("credit", 1), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")]
    fn test_ledger_error_mapping(
        #[case] err: LedgerError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let message = err.to_string();
        let api: ApiError = err.into();

        assert_eq!(api.status, status);
        assert_eq!(api.body.code, code);
        assert_eq!(api.body.message, message);
    }
}
