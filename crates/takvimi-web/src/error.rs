//! Error types for the Takvimi API

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use takvimi_core::{DataError, ExtractionError, Month, PdfReadError};
use takvimi_parsing::ExportError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

type Parts = (StatusCode, &'static str, String, Option<String>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details): Parts = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                internal()
            }
            AppError::Data(e) => data_parts(e),
            AppError::Export(e) => export_parts(e),
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

fn internal() -> Parts {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "An internal error occurred".to_string(),
        None,
    )
}

fn data_parts(e: DataError) -> Parts {
    match e {
        DataError::SourceNotFound { year } => (
            StatusCode::NOT_FOUND,
            "not_found",
            format!("No calendar PDF available for year {year}"),
            None,
        ),
        DataError::Extraction(e) => {
            tracing::error!(error = %e, "extraction failed");
            extraction_parts(&e)
        }
        DataError::Store(e) => {
            tracing::error!(error = %e, "cache error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "cache_error",
                "Cached calendar data could not be read or written".to_string(),
                None,
            )
        }
        DataError::Timeout { year, limit } => {
            tracing::error!(year, limit_secs = limit.as_secs(), "extraction timed out");
            (
                StatusCode::GATEWAY_TIMEOUT,
                "timeout",
                format!(
                    "Extraction of year {year} did not finish within {} seconds",
                    limit.as_secs()
                ),
                None,
            )
        }
        DataError::Worker(msg) => {
            tracing::error!("Extraction worker error: {}", msg);
            internal()
        }
    }
}

/// Extraction failures keep their month-level diagnostics; PDF read
/// failures are reported without paths.
fn extraction_parts(e: &ExtractionError) -> Parts {
    let details = match e {
        ExtractionError::Pdf(_) => None,
        ExtractionError::YearExtractionFailed { failures, .. } => Some(
            failures
                .iter()
                .map(|f| match &f.error {
                    ExtractionError::Pdf(_) => format!("{}: unreadable PDF", f.month),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
        ),
        other => Some(other.to_string()),
    };
    let message = match e.failed_months().as_slice() {
        [] => "Calendar PDF could not be read".to_string(),
        months => format!("Extraction failed for months {}", month_list(months)),
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "extraction_failed",
        message,
        details,
    )
}

fn export_parts(e: ExportError) -> Parts {
    match e {
        ExportError::Pdf(PdfReadError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            "not_found",
            "Calendar PDF not found".to_string(),
            None,
        ),
        ExportError::Pdf(e @ PdfReadError::PageOutOfRange { .. }) => {
            (StatusCode::NOT_FOUND, "not_found", e.to_string(), None)
        }
        other => {
            tracing::error!(error = %other, "page export failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "export_failed",
                "Page could not be exported".to_string(),
                None,
            )
        }
    }
}

fn month_list(months: &[Month]) -> String {
    months
        .iter()
        .map(|m| m.key())
        .collect::<Vec<_>>()
        .join(", ")
}
