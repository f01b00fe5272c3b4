//! Synchronous analysis DTOs for the v1 API.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{AnalysisResult, CachedAnalysis};

/// Request body for `POST /v1/analyze`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
}

/// The four-part summary of one document.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub title: String,
    pub summary: String,
    /// Key findings in the order the provider emitted them.
    pub takeaways: Vec<String>,
    pub methodology: String,
}

impl From<AnalysisResult> for AnalysisResponse {
    fn from(result: AnalysisResult) -> Self {
        Self {
            title: result.title,
            summary: result.summary,
            takeaways: result.takeaways,
            methodology: result.methodology,
        }
    }
}

/// Response body for `POST /v1/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub analysis: AnalysisResponse,
    /// `true` when the result came from the cache without a new provider call.
    pub cached: bool,
}

impl From<CachedAnalysis> for AnalyzeResponse {
    fn from(cached: CachedAnalysis) -> Self {
        Self {
            analysis: cached.result.into(),
            cached: cached.cached,
        }
    }
}

/// One cache entry, keyed by normalized source URL.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CachedAnalysisEntry {
    pub url: String,
    #[serde(flatten)]
    pub analysis: AnalysisResponse,
}

/// Response body for `GET /v1/analyses`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListAnalysesResponse {
    pub analyses: Vec<CachedAnalysisEntry>,
}
