//! Database connection manager backed by the SQLite pool.

use std::path::{Path, PathBuf};

use almanac_domain::{AlmanacError, DatabaseConfig, Result};
use chrono::{DateTime, Utc};
use rusqlite::params;
use tokio::task;
use tracing::info;

use super::pool::{create_pool, SqliteConnection, SqlitePool, SqlitePoolConfig};
use crate::errors::InfraError;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that wraps an [`SqlitePool`].
pub struct DbManager {
    pool: SqlitePool,
    path: PathBuf,
}

impl DbManager {
    /// Open (or create) the database at `db_path`.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let config = SqlitePoolConfig { max_size: pool_size.max(1), ..SqlitePoolConfig::default() };
        Self::with_config(db_path, &config)
    }

    /// Open the database described by the configuration section.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::with_config(&config.path, &SqlitePoolConfig::from(config))
    }

    pub fn with_config<P: AsRef<Path>>(db_path: P, config: &SqlitePoolConfig) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let pool = create_pool(&path, config)?;

        info!(db_path = %path.display(), max_connections = config.max_size, "sqlite pool initialised");

        Ok(Self { pool, path })
    }

    /// Borrow the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Acquire a connection from the pool.
    pub fn get_connection(&self) -> Result<SqliteConnection> {
        self.pool.get().map_err(|e| InfraError::from(e).into())
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        create_schema(&conn)?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verify the database is reachable and responding.
    pub fn health_check(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", params![], |row| row.get::<_, i32>(0)).map_err(map_sql_error)?;
        Ok(())
    }
}

fn create_schema(conn: &SqliteConnection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?, CAST(strftime('%s','now') AS INTEGER))",
        params![SCHEMA_VERSION],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

pub(crate) fn map_sql_error(err: rusqlite::Error) -> AlmanacError {
    AlmanacError::from(InfraError::from(err))
}

pub(crate) fn map_join_error(err: task::JoinError) -> AlmanacError {
    if err.is_cancelled() {
        AlmanacError::Internal("blocking task cancelled".into())
    } else {
        AlmanacError::Internal(format!("blocking task failed: {err}"))
    }
}

/// Read a Unix-seconds column as a UTC timestamp.
pub(crate) fn column_ts(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(idx)?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Integer,
            format!("timestamp {secs} out of range").into(),
        )
    })
}
