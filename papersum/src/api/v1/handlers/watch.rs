//! `GET /api/v1/jobs/{jobId}/watch` as Server-Sent Events.
//!
//! Event names:
//! - `status`: `{jobId, status}` while the job is PENDING or PROCESSING
//! - `result`: the full job record once it is COMPLETED or FAILED
//! - `error`: `{code, message}` for an unknown job or a store failure
//!
//! The stream ends after `result` or `error`. Disconnecting only stops
//! the polling for this client.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::Serialize;

use crate::api::v1::dto::{JobResponse, JobStatusEvent};
use crate::api::v1::response::{ApiError, ErrorCode};
use crate::api::AppState;
use crate::services::WatchEvent;

#[utoipa::path(
    get,
    path = "/api/v1/jobs/{jobId}/watch",
    tag = "jobs",
    operation_id = "jobs.watch",
    params(
        ("jobId" = i64, Path, description = "Job identifier"),
    ),
    responses(
        (status = 200, description = "SSE stream of `status`, `result` and `error` events", content_type = "text/event-stream", body = String),
    )
)]
pub async fn watch_job(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(job_id, "Status watch opened");
    let events = state
        .watcher
        .watch(job_id)
        .inspect(move |event| {
            if event.is_final() {
                tracing::debug!(job_id, "Status watch closed");
            }
        })
        .map(|event| Ok::<_, Infallible>(to_sse_event(event)));

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn to_sse_event(event: WatchEvent) -> Event {
    match event {
        WatchEvent::Status { job_id, status } => json_event(
            "status",
            &JobStatusEvent {
                job_id,
                status: status.into(),
            },
        ),
        WatchEvent::Finished(job) => json_event("result", &JobResponse::from(job)),
        WatchEvent::NotFound { job_id } => json_event(
            "error",
            &ApiError {
                code: ErrorCode::NotFound,
                message: format!("Job {job_id} not found"),
            },
        ),
        WatchEvent::Error { .. } => json_event(
            "error",
            &ApiError {
                code: ErrorCode::InternalError,
                message: "An internal error occurred".to_string(),
            },
        ),
    }
}

fn json_event<T: Serialize>(name: &str, payload: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(payload)
        .unwrap_or_else(|e| {
            tracing::error!(event = name, error = %e, "Failed to encode SSE payload");
            Event::default().event("error").data("encoding failed")
        })
}
