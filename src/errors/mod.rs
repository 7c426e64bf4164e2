/// Unified error handling module
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Unified error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AstroError {
    /// Out-of-range coordinates, dates or parameters.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The ephemeris has no data for the requested body/instant.
    #[error("Calculation unavailable: {0}")]
    CalculationUnavailable(String),

    /// One item of an aggregate failed; the aggregate itself is still usable.
    #[error("Partial result: {0}")]
    PartialResult(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AstroError {
    pub fn code(&self) -> &'static str {
        match self {
            AstroError::InvalidInput(_) => "INVALID_INPUT",
            AstroError::CalculationUnavailable(_) => "CALCULATION_UNAVAILABLE",
            AstroError::PartialResult(_) => "PARTIAL_RESULT",
            AstroError::Unexpected(_) => "UNEXPECTED",
        }
    }

    /// Wrap a per-item failure so it can be reported next to a reduced result.
    pub fn partial(item: impl std::fmt::Display, cause: &AstroError) -> Self {
        AstroError::PartialResult(format!("{item} skipped: {cause}"))
    }
}

impl From<anyhow::Error> for AstroError {
    fn from(err: anyhow::Error) -> Self {
        AstroError::Unexpected(err.to_string())
    }
}

impl From<serde_json::Error> for AstroError {
    fn from(err: serde_json::Error) -> Self {
        AstroError::InvalidInput(format!("malformed JSON: {}", err))
    }
}

impl From<tokio::task::JoinError> for AstroError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            AstroError::Unexpected("calculation worker panicked".to_string())
        } else {
            AstroError::Unexpected(format!("calculation worker failed: {}", err))
        }
    }
}

impl IntoResponse for AstroError {
    fn into_response(self) -> Response {
        let error_response = ErrorResponse {
            ok: false,
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };

        // Always HTTP 200 with ok=false; clients branch on the envelope
        (StatusCode::OK, Json(error_response)).into_response()
    }
}

/// Type alias for results crossing the core boundary
pub type ApiResult<T> = Result<T, AstroError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AstroError::InvalidInput("x".into()).code(), "INVALID_INPUT");
        assert_eq!(
            AstroError::CalculationUnavailable("x".into()).code(),
            "CALCULATION_UNAVAILABLE"
        );
        assert_eq!(AstroError::PartialResult("x".into()).code(), "PARTIAL_RESULT");
        assert_eq!(AstroError::Unexpected("x".into()).code(), "UNEXPECTED");
    }

    #[test]
    fn test_partial_wraps_cause() {
        let cause = AstroError::CalculationUnavailable("no data for Earth".into());
        let err = AstroError::partial("Earth", &cause);
        assert_eq!(
            err.to_string(),
            "Partial result: Earth skipped: Calculation unavailable: no data for Earth"
        );
    }

    #[test]
    fn test_anyhow_maps_to_unexpected() {
        let err: AstroError = anyhow::anyhow!("boom").into();
        assert_eq!(err, AstroError::Unexpected("boom".into()));
    }
}
