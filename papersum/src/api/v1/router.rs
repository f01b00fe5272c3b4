use axum::{
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;

pub fn v1_router() -> Router<AppState> {
    let jobs = Router::new()
        .route("/", post(handlers::jobs::submit_job))
        .route("/{jobId}", get(handlers::jobs::get_job))
        .route("/{jobId}/watch", get(handlers::watch::watch_job));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router())
        .nest("/jobs", jobs)
        .route("/results", get(handlers::jobs::list_results))
        .route("/analyze", post(handlers::analyze::analyze_url))
        .route("/analyses", get(handlers::analyze::list_analyses))
}
