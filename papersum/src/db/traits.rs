use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AnalysisResult, Job, JobStatus};

/// Durable job table operations.
///
/// Status transitions are only ever PENDING -> PROCESSING (via
/// [`claim_next_job`](JobStore::claim_next_job)) and PROCESSING -> COMPLETED
/// or FAILED. Writes that would leave any other state are no-ops and report
/// `false`.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a PENDING job with no content and return it with its id.
    async fn create_job(&self, url: &str) -> Result<Job>;

    async fn get_job(&self, id: i64) -> Result<Option<Job>>;

    /// Atomically move the lowest-id PENDING job to PROCESSING and return it.
    /// Two concurrent callers never receive the same job.
    async fn claim_next_job(&self) -> Result<Option<Job>>;

    async fn complete_job(&self, id: i64, result: &AnalysisResult) -> Result<bool>;

    async fn fail_job(&self, id: i64, error_message: &str) -> Result<bool>;

    /// Jobs with the given status, lowest id first.
    async fn list_jobs(&self, status: JobStatus) -> Result<Vec<Job>>;
}

/// A complete database backend: the job store plus lifecycle operations.
#[async_trait]
pub trait DatabaseBackend: JobStore {
    /// Sync with remote (e.g. Turso replication). No-op for local-only backends.
    async fn sync(&self) -> Result<()>;
}
