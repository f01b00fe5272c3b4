use libsql::Connection;

use crate::error::Result;

pub async fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Summarization jobs, one row per submitted URL
        CREATE TABLE IF NOT EXISTS jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'PENDING',
            title TEXT,
            summary TEXT,
            takeaways TEXT,
            methodology TEXT,
            error_message TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        -- The worker's claim query filters on status and orders by id
        CREATE INDEX IF NOT EXISTS idx_jobs_status_id ON jobs(status, id);
        "#,
    )
    .await?;

    Ok(())
}
