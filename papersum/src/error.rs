use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::v1::response::ApiResponse;

#[derive(Error, Debug)]
pub enum PapersumError {
    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Could not retrieve source: {0}")]
    Fetch(String),

    #[error("No content to summarize: {0}")]
    NoContent(String),

    #[error("Summarization failed: {0}")]
    Llm(String),

    #[error("Summarization failed: LLM provider not configured: {0}")]
    LlmUnavailable(String),

    #[error("Summarization failed: LLM provider rejected credentials: {0}")]
    LlmAuth(String),

    #[error("Summarization failed: LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },

    #[error("Summarization failed: malformed provider reply: {0}")]
    MalformedReply(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Client-facing failure classes. Several variants collapse onto one class,
/// e.g. a provider outage and an unparseable reply are both `Summarization`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Retrieval,
    NoContent,
    Summarization,
    Other,
}

impl PapersumError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(_) | Self::Http(_) => ErrorCategory::Retrieval,
            Self::NoContent(_) => ErrorCategory::NoContent,
            Self::Llm(_)
            | Self::LlmUnavailable(_)
            | Self::LlmAuth(_)
            | Self::LlmRateLimit { .. }
            | Self::MalformedReply(_) => ErrorCategory::Summarization,
            Self::Database(_)
            | Self::NotFound(_)
            | Self::Validation(_)
            | Self::Json(_)
            | Self::Io(_)
            | Self::UrlParse(_)
            | Self::Internal(_) => ErrorCategory::Other,
        }
    }
}

impl IntoResponse for PapersumError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::from(self).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PapersumError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_and_transport_errors_are_retrieval() {
        assert_eq!(
            PapersumError::Fetch("HTTP 404".into()).category(),
            ErrorCategory::Retrieval
        );
    }

    #[test]
    fn provider_and_parse_errors_share_a_category() {
        let provider = PapersumError::Llm("quota".into());
        let parse = PapersumError::MalformedReply("missing <title>".into());
        assert_eq!(provider.category(), ErrorCategory::Summarization);
        assert_eq!(parse.category(), ErrorCategory::Summarization);
        assert!(provider.to_string().starts_with("Summarization failed"));
        assert!(parse.to_string().starts_with("Summarization failed"));
    }

    #[test]
    fn not_configured_is_distinct_from_rejected() {
        let missing = PapersumError::LlmUnavailable("no model".into());
        let rejected = PapersumError::LlmAuth("401".into());
        assert!(missing.to_string().contains("not configured"));
        assert!(rejected.to_string().contains("rejected"));
        assert!(matches!(missing, PapersumError::LlmUnavailable(_)));
    }

    #[test]
    fn empty_content_message() {
        let err = PapersumError::NoContent("extracted text is empty".into());
        assert_eq!(err.category(), ErrorCategory::NoContent);
        assert_eq!(
            err.to_string(),
            "No content to summarize: extracted text is empty"
        );
    }
}
