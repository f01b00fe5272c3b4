use std::sync::Arc;
use std::time::Duration;

use futures::Stream;

use crate::db::DatabaseBackend;
use crate::models::{Job, JobStatus};

/// One message on a job's status channel.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// The job is still PENDING or PROCESSING.
    Status { job_id: i64, status: JobStatus },
    /// The job reached COMPLETED or FAILED; always the last event.
    Finished(Job),
    NotFound { job_id: i64 },
    Error { job_id: i64, message: String },
}

impl WatchEvent {
    /// True for the event that ends the stream.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Status { .. })
    }
}

/// Polls the job store and turns one job's progress into a stream.
///
/// Read-only: watching never changes a job, and dropping the stream
/// (e.g. a disconnected client) has no effect on processing.
#[derive(Clone)]
pub struct StatusWatcher {
    db: Arc<dyn DatabaseBackend>,
    interval: Duration,
}

impl StatusWatcher {
    pub fn new(db: Arc<dyn DatabaseBackend>, interval: Duration) -> Self {
        Self { db, interval }
    }

    pub fn watch(&self, job_id: i64) -> impl Stream<Item = WatchEvent> + Send + 'static {
        let db = Arc::clone(&self.db);
        let interval = self.interval;

        async_stream::stream! {
            loop {
                match db.get_job(job_id).await {
                    Ok(Some(job)) if job.status.is_terminal() => {
                        yield WatchEvent::Finished(job);
                        break;
                    }
                    Ok(Some(job)) => {
                        yield WatchEvent::Status { job_id, status: job.status };
                    }
                    Ok(None) => {
                        yield WatchEvent::NotFound { job_id };
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(job_id, error = %e, "Status watch failed");
                        yield WatchEvent::Error { job_id, message: e.to_string() };
                        break;
                    }
                }

                tokio::time::sleep(interval).await;
            }
        }
    }
}
