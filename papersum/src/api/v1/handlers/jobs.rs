//! v1 Job handlers.
//!
//! Submission returns as soon as the job is stored; a separate worker
//! drives it to COMPLETED or FAILED. Clients poll `GET /jobs/{jobId}` or
//! subscribe to `GET /jobs/{jobId}/watch`.

use axum::extract::{Path, State};

use crate::api::extractors::{validate_body, AppJson};
use crate::api::v1::dto::{JobResponse, ListResultsResponse, SubmitJobRequest};
use crate::api::v1::response::{ApiError, ApiResponse, ResponseMeta};
use crate::api::AppState;

/// `POST /api/v1/jobs`
///
/// Queues a URL for summarization. Every call creates a new job, even for
/// a URL that was submitted before.
#[utoipa::path(
    post,
    path = "/api/v1/jobs",
    tag = "jobs",
    operation_id = "jobs.submit",
    request_body = SubmitJobRequest,
    responses(
        (status = 201, description = "Job created in PENDING state", body = JobResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn submit_job(
    State(state): State<AppState>,
    AppJson(req): AppJson<SubmitJobRequest>,
) -> ApiResponse<JobResponse> {
    if let Err(e) = validate_body(&req) {
        return e.into();
    }

    match state.jobs.submit(&req.url).await {
        Ok(job) => ApiResponse::created(job.into()),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/jobs/{jobId}`
#[utoipa::path(
    get,
    path = "/api/v1/jobs/{jobId}",
    tag = "jobs",
    operation_id = "jobs.get",
    params(
        ("jobId" = i64, Path, description = "Job identifier"),
    ),
    responses(
        (status = 200, description = "Current job record", body = JobResponse),
        (status = 404, description = "Job not found", body = ApiError),
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> ApiResponse<JobResponse> {
    match state.jobs.get(job_id).await {
        Ok(job) => ApiResponse::success(job.into()),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/results`
///
/// Every COMPLETED job, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/results",
    tag = "jobs",
    operation_id = "jobs.results",
    responses(
        (status = 200, description = "Completed jobs", body = ListResultsResponse),
    )
)]
pub async fn list_results(State(state): State<AppState>) -> ApiResponse<ListResultsResponse> {
    match state.jobs.list_completed().await {
        Ok(jobs) => {
            let total = jobs.len() as u64;
            ApiResponse::success_with_meta(
                ListResultsResponse {
                    jobs: jobs.into_iter().map(JobResponse::from).collect(),
                },
                ResponseMeta { total: Some(total) },
            )
        }
        Err(e) => e.into(),
    }
}
