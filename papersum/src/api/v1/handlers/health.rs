use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;
use crate::llm::LlmBackend;

/// Health data returned inside the v1 envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub database: DatabaseStatus,
    pub llm: LlmStatus,
    pub cache: CacheStatus,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DatabaseStatus {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LlmStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CacheStatus {
    pub entries: usize,
    /// 0 means unbounded.
    pub capacity: usize,
}

/// `GET /api/v1/health`
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let db_status = match state.db.sync().await {
        Ok(_) => DatabaseStatus {
            status: "ok".to_string(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Health check database sync failed");
            DatabaseStatus {
                status: "error".to_string(),
            }
        }
    };

    let llm_status = match state.llm.backend() {
        LlmBackend::Unavailable { reason } => LlmStatus {
            status: "unavailable".to_string(),
            provider: None,
            model: state.llm.model().map(str::to_string),
            reason: Some(reason.clone()),
        },
        backend => LlmStatus {
            status: "available".to_string(),
            provider: backend.name().map(str::to_string),
            model: state.llm.model().map(str::to_string),
            reason: None,
        },
    };

    ApiResponse::success(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        llm: llm_status,
        cache: CacheStatus {
            entries: state.cache.len(),
            capacity: state.config.cache.capacity,
        },
    })
}
