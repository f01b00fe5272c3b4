//! # V1 API Response Envelope & Error Contract
//!
//! Every v1 endpoint returns an [`ApiResponse<T>`] envelope with three
//! optional top-level fields:
//!
//! ```json
//! {
//!   "data": { ... },                  // present on success, absent on error
//!   "meta": { "total": 3 },           // optional list metadata
//!   "error": { "code": "no_content", "message": "..." }  // present on error
//! }
//! ```
//!
//! Job ids are positive integers assigned by the job store.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, PapersumError};

/// Machine-readable error code included in every error response.
///
/// Serialized as a snake_case string on the wire (e.g. `"invalid_request"`).
/// Each variant maps to a fixed HTTP status code via [`ErrorCode::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request was malformed or failed validation. HTTP 400.
    InvalidRequest,
    /// The requested resource does not exist. HTTP 404.
    NotFound,
    /// The source document could not be downloaded. HTTP 502.
    SourceUnavailable,
    /// The document was downloaded but yielded no text to summarize. HTTP 422.
    NoContent,
    /// The provider failed or its reply could not be parsed. HTTP 502.
    SummarizationFailed,
    /// An unexpected server-side error occurred. Internal details are never
    /// leaked to the client. HTTP 500.
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::SourceUnavailable => StatusCode::BAD_GATEWAY,
            Self::NoContent => StatusCode::UNPROCESSABLE_ENTITY,
            Self::SummarizationFailed => StatusCode::BAD_GATEWAY,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::NotFound => write!(f, "not_found"),
            Self::SourceUnavailable => write!(f, "source_unavailable"),
            Self::NoContent => write!(f, "no_content"),
            Self::SummarizationFailed => write!(f, "summarization_failed"),
            Self::InternalError => write!(f, "internal_error"),
        }
    }
}

/// Structured error payload within the API envelope.
///
/// ```json
/// { "code": "not_found", "message": "Job 7 not found" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    pub code: ErrorCode,
    /// Human-readable description safe to display to end users.
    pub message: String,
}

/// Metadata included in list responses.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Canonical v1 API response envelope.
///
/// On success, `data` is present and `error` is absent. On error, `error`
/// is present and `data` is absent. The HTTP status is derived from the
/// error code, or from the constructor used on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// HTTP status to use in the response. Not serialized on the wire.
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success response with data (HTTP 200).
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            meta: None,
            error: None,
            status: StatusCode::OK,
        }
    }

    /// Success response with data and metadata (HTTP 200).
    pub fn success_with_meta(data: T, meta: ResponseMeta) -> Self {
        Self {
            data: Some(data),
            meta: Some(meta),
            error: None,
            status: StatusCode::OK,
        }
    }

    /// Resource created response (HTTP 201).
    pub fn created(data: T) -> Self {
        Self {
            data: Some(data),
            meta: None,
            error: None,
            status: StatusCode::CREATED,
        }
    }

    /// Error response. HTTP status is derived from the [`ErrorCode`].
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = code.status();
        Self {
            data: None,
            meta: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
            status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(_) => {
                let body = serde_json::json!({
                    "error": {
                        "code": "internal_error",
                        "message": "An internal error occurred"
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl<T: Serialize> From<PapersumError> for ApiResponse<T> {
    /// Convert a [`PapersumError`] into a v1 [`ApiResponse`].
    ///
    /// Retrieval, content and summarization failures keep their message so
    /// the caller can tell them apart. For `internal_error` a generic message
    /// is returned and the real error is logged.
    fn from(err: PapersumError) -> Self {
        match err.category() {
            ErrorCategory::Retrieval => {
                ApiResponse::error(ErrorCode::SourceUnavailable, err.to_string())
            }
            ErrorCategory::NoContent => ApiResponse::error(ErrorCode::NoContent, err.to_string()),
            ErrorCategory::Summarization => {
                ApiResponse::error(ErrorCode::SummarizationFailed, err.to_string())
            }
            ErrorCategory::Other => match err {
                PapersumError::NotFound(msg) => ApiResponse::error(ErrorCode::NotFound, msg),
                PapersumError::Validation(msg) => {
                    ApiResponse::error(ErrorCode::InvalidRequest, msg)
                }
                PapersumError::Json(e) => {
                    ApiResponse::error(ErrorCode::InvalidRequest, format!("Invalid JSON: {e}"))
                }
                PapersumError::UrlParse(e) => {
                    ApiResponse::error(ErrorCode::InvalidRequest, format!("Invalid URL: {e}"))
                }
                internal => {
                    tracing::error!(error = %internal, "Internal error mapped to v1 response");
                    ApiResponse::error(ErrorCode::InternalError, "An internal error occurred")
                }
            },
        }
    }
}
