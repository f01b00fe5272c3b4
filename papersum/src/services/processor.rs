use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::db::DatabaseBackend;
use crate::error::Result;
use crate::models::Job;
use crate::processing::AnalysisPipeline;

/// The worker side of the job queue: claims one PENDING job per pass and
/// drives it to COMPLETED or FAILED.
#[derive(Clone)]
pub struct JobProcessor {
    db: Arc<dyn DatabaseBackend>,
    pipeline: AnalysisPipeline,
    interval_secs: u64,
}

impl JobProcessor {
    pub fn new(db: Arc<dyn DatabaseBackend>, pipeline: AnalysisPipeline, interval_secs: u64) -> Self {
        Self {
            db,
            pipeline,
            interval_secs,
        }
    }

    /// Process at most one job.
    ///
    /// Returns the job in its terminal state, or `None` when nothing was
    /// pending. Analysis failures are recorded on the job and never returned;
    /// only store errors surface as `Err`.
    pub async fn run_once(&self) -> Result<Option<Job>> {
        let Some(job) = self.db.claim_next_job().await? else {
            debug!("No pending jobs");
            return Ok(None);
        };

        info!(job_id = job.id, url = %job.url, "Processing job");

        let written = match self.pipeline.analyze(&job.url).await {
            Ok(result) => match self.db.complete_job(job.id, &result).await {
                Ok(written) => written,
                Err(e) => {
                    // Never leave a claimed job in PROCESSING; nothing reclaims it.
                    error!(job_id = job.id, error = %e, "Could not store job result");
                    self.record_failure(job.id, &format!("Could not store result: {e}"))
                        .await?
                }
            },
            Err(e) => {
                warn!(
                    job_id = job.id,
                    category = ?e.category(),
                    error = %e,
                    "Job failed"
                );
                self.record_failure(job.id, &e.to_string()).await?
            }
        };

        if !written {
            warn!(
                job_id = job.id,
                "Job left PROCESSING before its result was written"
            );
        }

        let finished = self.db.get_job(job.id).await?;
        if let Some(finished) = &finished {
            info!(job_id = finished.id, status = %finished.status, "Job finished");
        }
        Ok(finished)
    }

    async fn record_failure(&self, id: i64, message: &str) -> Result<bool> {
        self.db.fail_job(id, message).await.map_err(|e| {
            error!(job_id = id, error = %e, "Could not mark job FAILED; it stays PROCESSING");
            e
        })
    }

    /// Poll until `cancel_token` fires. A job already in flight runs to its
    /// terminal state; cancellation only interrupts the wait between passes.
    pub async fn run(&self, cancel_token: CancellationToken) {
        info!(interval_secs = self.interval_secs, "Job processor started");

        loop {
            if cancel_token.is_cancelled() {
                break;
            }

            if let Err(e) = self.run_once().await {
                error!(error = %e, "Job processor pass failed");
            }

            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = tokio::time::sleep(Duration::from_secs(self.interval_secs)) => {}
            }
        }

        info!("Job processor stopped");
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }
}
