//! SQLite connection pool
//!
//! r2d2-based pooling with per-connection pragmas (WAL, foreign keys, busy
//! timeout) applied when each connection is opened.

use std::path::Path;
use std::time::Duration;

use almanac_domain::{AlmanacError, DatabaseConfig, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{info, instrument, warn};

/// Pool of SQLite connections
pub type SqlitePool = Pool<SqliteConnectionManager>;

/// Connection checked out of a [`SqlitePool`]
pub type SqliteConnection = PooledConnection<SqliteConnectionManager>;

/// SQLite pool configuration
#[derive(Debug, Clone)]
pub struct SqlitePoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,

    /// How long to wait for a free connection
    pub connection_timeout: Duration,

    /// Busy timeout for SQLite operations
    pub busy_timeout: Duration,

    /// Enable WAL journal mode
    pub enable_wal: bool,

    /// Enable foreign key constraints
    pub enable_foreign_keys: bool,
}

impl From<&DatabaseConfig> for SqlitePoolConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_size: config.pool_size.max(1),
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
            ..Self::default()
        }
    }
}

impl Default for SqlitePoolConfig {
    fn default() -> Self {
        Self {
            max_size: 8,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_millis(5000),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

/// Build a pool for the database file at `path` and verify it opens.
#[instrument(skip(config), fields(db_path = ?path, pool_size = config.max_size))]
pub fn create_pool(path: &Path, config: &SqlitePoolConfig) -> Result<SqlitePool> {
    let pragma_config = config.clone();
    let manager = SqliteConnectionManager::file(path)
        .with_init(move |conn| apply_connection_pragmas(conn, &pragma_config));

    let pool = Pool::builder()
        .max_size(config.max_size)
        .connection_timeout(config.connection_timeout)
        .build(manager)
        .map_err(|e| {
            warn!(error = %e, "failed to create connection pool");
            AlmanacError::Database(format!("failed to create pool: {e}"))
        })?;

    info!("sqlite pool created with {} connections", config.max_size);
    Ok(pool)
}

/// Apply connection-level pragmas
pub fn apply_connection_pragmas(
    conn: &Connection,
    config: &SqlitePoolConfig,
) -> rusqlite::Result<()> {
    let mut pragma_sql = String::new();

    if config.enable_wal {
        pragma_sql.push_str("PRAGMA journal_mode=WAL;\n");
        pragma_sql.push_str("PRAGMA wal_autocheckpoint=1000;\n");
    }

    pragma_sql.push_str("PRAGMA synchronous=NORMAL;\n");

    if config.enable_foreign_keys {
        pragma_sql.push_str("PRAGMA foreign_keys=ON;\n");
    }

    conn.execute_batch(&pragma_sql)?;
    conn.busy_timeout(config.busy_timeout)?;
    Ok(())
}
