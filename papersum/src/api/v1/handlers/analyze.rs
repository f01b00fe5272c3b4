//! v1 synchronous analysis handlers.
//!
//! `POST /analyze` runs the whole pipeline inside the request and memoizes
//! the result in memory by URL. Nothing here touches the job store.

use axum::extract::State;

use crate::api::extractors::{validate_body, AppJson};
use crate::api::v1::dto::{
    AnalyzeRequest, AnalyzeResponse, CachedAnalysisEntry, ListAnalysesResponse,
};
use crate::api::v1::response::{ApiError, ApiResponse, ResponseMeta};
use crate::api::AppState;

/// `POST /api/v1/analyze`
#[utoipa::path(
    post,
    path = "/api/v1/analyze",
    tag = "analysis",
    operation_id = "analysis.analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis, fresh or cached", body = AnalyzeResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 422, description = "Document has no extractable text", body = ApiError),
        (status = 502, description = "Source or provider failure", body = ApiError),
    )
)]
pub async fn analyze_url(
    State(state): State<AppState>,
    AppJson(req): AppJson<AnalyzeRequest>,
) -> ApiResponse<AnalyzeResponse> {
    if let Err(e) = validate_body(&req) {
        return e.into();
    }

    match state.cache.analyze(&req.url).await {
        Ok(analysis) => ApiResponse::success(analysis.into()),
        Err(e) => {
            tracing::warn!(url = %req.url, error = %e, "Synchronous analysis failed");
            e.into()
        }
    }
}

/// `GET /api/v1/analyses`
#[utoipa::path(
    get,
    path = "/api/v1/analyses",
    tag = "analysis",
    operation_id = "analysis.list",
    responses(
        (status = 200, description = "Cached analyses sorted by URL", body = ListAnalysesResponse),
    )
)]
pub async fn list_analyses(State(state): State<AppState>) -> ApiResponse<ListAnalysesResponse> {
    let analyses: Vec<CachedAnalysisEntry> = state
        .cache
        .entries()
        .into_iter()
        .map(|(url, result)| CachedAnalysisEntry {
            url,
            analysis: result.into(),
        })
        .collect();
    let total = analyses.len() as u64;

    ApiResponse::success_with_meta(
        ListAnalysesResponse { analyses },
        ResponseMeta { total: Some(total) },
    )
}
