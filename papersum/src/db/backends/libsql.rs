use async_trait::async_trait;

use crate::db::connection::Database;
use crate::db::repository::JobRepository;
use crate::db::traits::{DatabaseBackend, JobStore};
use crate::error::Result;
use crate::models::{AnalysisResult, Job, JobStatus};

pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JobStore for LibSqlBackend {
    async fn create_job(&self, url: &str) -> Result<Job> {
        let conn = self.db.connect().await?;
        JobRepository::create(&conn, url).await
    }
    async fn get_job(&self, id: i64) -> Result<Option<Job>> {
        let conn = self.db.connect().await?;
        JobRepository::get_by_id(&conn, id).await
    }
    async fn claim_next_job(&self) -> Result<Option<Job>> {
        let conn = self.db.connect().await?;
        JobRepository::claim_next(&conn).await
    }
    async fn complete_job(&self, id: i64, result: &AnalysisResult) -> Result<bool> {
        let conn = self.db.connect().await?;
        JobRepository::complete(&conn, id, result).await
    }
    async fn fail_job(&self, id: i64, error_message: &str) -> Result<bool> {
        let conn = self.db.connect().await?;
        JobRepository::fail(&conn, id, error_message).await
    }
    async fn list_jobs(&self, status: JobStatus) -> Result<Vec<Job>> {
        let conn = self.db.connect().await?;
        JobRepository::list_by_status(&conn, status).await
    }
}

#[async_trait]
impl DatabaseBackend for LibSqlBackend {
    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use std::collections::HashSet;
    use std::sync::Arc;

    async fn file_backend(dir: &tempfile::TempDir) -> LibSqlBackend {
        let config = DatabaseConfig::local_file(dir.path().join("jobs.db"));
        LibSqlBackend::new(Database::new(&config).await.unwrap())
    }

    #[tokio::test]
    async fn test_jobs_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();

        let id = {
            let backend = file_backend(&dir).await;
            backend
                .create_job("https://example.org/paper.pdf")
                .await
                .unwrap()
                .id
        };

        let backend = file_backend(&dir).await;
        let job = backend.get_job(id).await.unwrap().unwrap();
        assert_eq!(job.url, "https://example.org/paper.pdf");
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_never_share_a_job() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(file_backend(&dir).await);

        for i in 0..12 {
            backend
                .create_job(&format!("https://example.org/{i}"))
                .await
                .unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..4 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                let mut claimed = Vec::new();
                while let Some(job) = backend.claim_next_job().await.unwrap() {
                    assert_eq!(job.status, JobStatus::Processing);
                    claimed.push(job.id);
                }
                claimed
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }

        let unique: HashSet<i64> = all.iter().copied().collect();
        assert_eq!(all.len(), 12);
        assert_eq!(unique.len(), 12);
        assert!(backend
            .list_jobs(JobStatus::Pending)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_local_sync_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let backend = file_backend(&dir).await;
        backend.sync().await.unwrap();
    }
}
