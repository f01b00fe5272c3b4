use std::sync::Arc;

use url::Url;

use crate::db::DatabaseBackend;
use crate::error::{PapersumError, Result};
use crate::models::{Job, JobStatus};

/// Submission and lookup side of the job queue.
#[derive(Clone)]
pub struct JobService {
    db: Arc<dyn DatabaseBackend>,
}

impl JobService {
    pub fn new(db: Arc<dyn DatabaseBackend>) -> Self {
        Self { db }
    }

    /// Store a new PENDING job for `url` and return it.
    ///
    /// The same URL may be submitted any number of times; each call creates
    /// an independent job.
    pub async fn submit(&self, url: &str) -> Result<Job> {
        let url = validate_source_url(url)?;
        let job = self.db.create_job(url.as_str()).await?;
        tracing::info!(job_id = job.id, url = %job.url, "Job submitted");
        Ok(job)
    }

    pub async fn get(&self, id: i64) -> Result<Job> {
        self.db
            .get_job(id)
            .await?
            .ok_or_else(|| PapersumError::NotFound(format!("Job {id} not found")))
    }

    pub async fn list_completed(&self) -> Result<Vec<Job>> {
        self.db.list_jobs(JobStatus::Completed).await
    }
}

/// Accept only absolute http(s) URLs with a host.
pub fn validate_source_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PapersumError::Validation("url is required".to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| PapersumError::Validation(format!("invalid url '{trimmed}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(PapersumError::Validation(format!(
            "unsupported url scheme '{}', expected http or https",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(PapersumError::Validation(format!(
            "url '{trimmed}' has no host"
        )));
    }

    Ok(url)
}
