use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::error::{PapersumError, Result};
use crate::models::{join_takeaways, split_takeaways, AnalysisResult, Job, JobStatus};

const JOB_COLUMNS: &str =
    "id, url, status, title, summary, takeaways, methodology, error_message, created_at, updated_at";

pub struct JobRepository;

impl JobRepository {
    pub async fn create(conn: &Connection, url: &str) -> Result<Job> {
        let now = Utc::now().to_rfc3339();
        let sql = format!(
            r#"
            INSERT INTO jobs (url, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING {JOB_COLUMNS}
            "#
        );

        let mut rows = conn
            .query(
                &sql,
                params![url, JobStatus::Pending.as_str(), now.clone(), now],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_job(&row),
            None => Err(PapersumError::Internal(
                "Job insert returned no row".to_string(),
            )),
        }
    }

    pub async fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1");
        let mut rows = conn.query(&sql, params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_job(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Single-statement compare-and-set: the subquery picks the lowest pending
    /// id and the outer `status = 'PENDING'` guard makes a losing racer update
    /// zero rows instead of re-claiming.
    pub async fn claim_next(conn: &Connection) -> Result<Option<Job>> {
        let sql = format!(
            r#"
            UPDATE jobs
            SET status = 'PROCESSING', updated_at = ?1
            WHERE id = (
                SELECT id FROM jobs
                WHERE status = 'PENDING'
                ORDER BY id ASC
                LIMIT 1
            )
            AND status = 'PENDING'
            RETURNING {JOB_COLUMNS}
            "#
        );

        let mut rows = conn.query(&sql, params![Utc::now().to_rfc3339()]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_job(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn complete(conn: &Connection, id: i64, result: &AnalysisResult) -> Result<bool> {
        let affected = conn
            .execute(
                r#"
                UPDATE jobs SET
                    status = 'COMPLETED',
                    title = ?2,
                    summary = ?3,
                    takeaways = ?4,
                    methodology = ?5,
                    error_message = NULL,
                    updated_at = ?6
                WHERE id = ?1 AND status = 'PROCESSING'
                "#,
                params![
                    id,
                    result.title.clone(),
                    result.summary.clone(),
                    join_takeaways(&result.takeaways),
                    result.methodology.clone(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .await?;

        Ok(affected > 0)
    }

    pub async fn fail(conn: &Connection, id: i64, error_message: &str) -> Result<bool> {
        let affected = conn
            .execute(
                r#"
                UPDATE jobs SET
                    status = 'FAILED',
                    title = NULL,
                    summary = NULL,
                    takeaways = NULL,
                    methodology = NULL,
                    error_message = ?2,
                    updated_at = ?3
                WHERE id = ?1 AND status = 'PROCESSING'
                "#,
                params![id, error_message, Utc::now().to_rfc3339()],
            )
            .await?;

        Ok(affected > 0)
    }

    pub async fn list_by_status(conn: &Connection, status: JobStatus) -> Result<Vec<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE status = ?1 ORDER BY id ASC");
        let mut rows = conn.query(&sql, params![status.as_str()]).await?;

        let mut jobs = Vec::new();
        while let Some(row) = rows.next().await? {
            jobs.push(Self::row_to_job(&row)?);
        }
        Ok(jobs)
    }

    fn row_to_job(row: &libsql::Row) -> Result<Job> {
        let status: String = row.get(2)?;
        let status = status.parse().map_err(PapersumError::Internal)?;

        Ok(Job {
            id: row.get(0)?,
            url: row.get(1)?,
            status,
            title: row.get(3)?,
            summary: row.get(4)?,
            takeaways: row
                .get::<Option<String>>(5)?
                .map(|joined| split_takeaways(&joined)),
            methodology: row.get(6)?,
            error_message: row.get(7)?,
            created_at: parse_timestamp(&row.get::<String>(8)?),
            updated_at: parse_timestamp(&row.get::<String>(9)?),
        })
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
