use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Papersum API",
        version = "1.0.0",
        description = "Turns a paper or article URL into a plain-language title, summary, methodology and key takeaways.",
    ),
    paths(
        handlers::health::health_check,
        handlers::jobs::submit_job,
        handlers::jobs::get_job,
        handlers::jobs::list_results,
        handlers::watch::watch_job,
        handlers::analyze::analyze_url,
        handlers::analyze::list_analyses,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        response::ResponseMeta,
        // Jobs
        dto::jobs::SubmitJobRequest,
        dto::jobs::V1JobStatus,
        dto::jobs::JobResponse,
        dto::jobs::ListResultsResponse,
        dto::jobs::JobStatusEvent,
        // Analysis
        dto::analysis::AnalyzeRequest,
        dto::analysis::AnalysisResponse,
        dto::analysis::AnalyzeResponse,
        dto::analysis::CachedAnalysisEntry,
        dto::analysis::ListAnalysesResponse,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::DatabaseStatus,
        handlers::health::LlmStatus,
        handlers::health::CacheStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "jobs", description = "Asynchronous summarization jobs"),
        (name = "analysis", description = "Synchronous cached analysis"),
    ),
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
