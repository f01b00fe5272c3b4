use libsql::{Builder, Connection};
use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::error::Result;

use super::schema;

/// Where the job table lives, derived from `DATABASE_URL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(String),
    Remote { url: String },
    /// Remote primary with a local embedded replica.
    Replica { url: String, local_path: String },
}

impl DatabaseLocation {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let url = config.url.trim();
        if url.starts_with("libsql://") || url.starts_with("https://") {
            match &config.local_path {
                Some(local_path) => Self::Replica {
                    url: url.to_string(),
                    local_path: local_path.clone(),
                },
                None => Self::Remote {
                    url: url.to_string(),
                },
            }
        } else if url == ":memory:" {
            Self::Memory
        } else {
            Self::File(url.strip_prefix("file:").unwrap_or(url).to_string())
        }
    }

    /// Pragmas only make sense for a SQLite file this process owns.
    fn is_local(&self) -> bool {
        matches!(self, Self::Memory | Self::File(_))
    }
}

#[derive(Clone)]
pub struct Database {
    db: Arc<libsql::Database>,
    location: DatabaseLocation,
    busy_timeout_ms: u64,
}

impl Database {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let location = DatabaseLocation::from_config(config);
        let auth_token = config.auth_token.clone().unwrap_or_default();

        let db = match &location {
            DatabaseLocation::Memory => Builder::new_local(":memory:").build().await?,
            DatabaseLocation::File(path) => Builder::new_local(path).build().await?,
            DatabaseLocation::Remote { url } => {
                Builder::new_remote(url.clone(), auth_token).build().await?
            }
            DatabaseLocation::Replica { url, local_path } => {
                Builder::new_remote_replica(local_path, url.clone(), auth_token)
                    .build()
                    .await?
            }
        };

        let database = Self {
            db: Arc::new(db),
            location,
            busy_timeout_ms: config.busy_timeout_ms,
        };

        let conn = database.connect().await?;
        if database.location.is_local() {
            apply_pragma(&conn, "journal_mode", config.journal_mode.as_str()).await;
            apply_pragma(&conn, "synchronous", config.synchronous.as_str()).await;
        }
        schema::init_schema(&conn).await?;

        tracing::debug!(location = ?database.location, "Job database ready");
        Ok(database)
    }

    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    /// Open a connection. `busy_timeout` is per connection in SQLite, so it is
    /// applied on every local connect.
    pub async fn connect(&self) -> Result<Connection> {
        let conn = self.db.connect()?;
        if self.location.is_local() {
            let sql = format!("PRAGMA busy_timeout = {}", self.busy_timeout_ms);
            if let Err(error) = conn.execute_batch(&sql).await {
                tracing::debug!(error = %error, "Failed to set busy_timeout on connection");
            }
        }
        Ok(conn)
    }

    /// Pull from the remote primary. Local files have nothing to sync.
    pub async fn sync(&self) -> Result<()> {
        if let DatabaseLocation::Replica { .. } = self.location {
            let replicated = self.db.sync().await?;
            tracing::debug!(?replicated, "Database synced");
        }
        Ok(())
    }
}

async fn apply_pragma(conn: &Connection, name: &str, value: &str) {
    let sql = format!("PRAGMA {name} = {value}");
    if let Err(error) = conn.execute_batch(&sql).await {
        tracing::warn!(pragma = name, value, error = %error, "Failed to set SQLite pragma");
    }
}
