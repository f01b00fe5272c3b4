use serde::{Deserialize, Serialize};

/// Structured summary of one document.
///
/// Built only by the reply parser; every field is populated and
/// `takeaways` keeps the order the provider emitted them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub title: String,
    pub summary: String,
    pub takeaways: Vec<String>,
    pub methodology: String,
}

/// An analysis plus whether it was served from the result cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedAnalysis {
    pub result: AnalysisResult,
    pub cached: bool,
}
