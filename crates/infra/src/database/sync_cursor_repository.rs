//! Per-user sync cursor storage.

use std::sync::Arc;

use almanac_core::SyncCursorRepository;
use almanac_domain::{Result, SyncCursor, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tokio::task;
use tracing::{debug, instrument};

use super::manager::{column_ts, map_join_error, map_sql_error, DbManager};

/// SQLite implementation of `SyncCursorRepository`
pub struct SqliteSyncCursorRepository {
    db: Arc<DbManager>,
}

impl SqliteSyncCursorRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SyncCursorRepository for SqliteSyncCursorRepository {
    #[instrument(skip(self))]
    async fn get(&self, user: UserId) -> Result<Option<SyncCursor>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Option<SyncCursor>> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT last_synced_at FROM sync_cursors WHERE user_id = ?1",
                params![user.get()],
                |row| Ok(SyncCursor { user_id: user, last_synced_at: column_ts(row, 0)? }),
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn advance(&self, user: UserId, at: DateTime<Utc>) -> Result<SyncCursor> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<SyncCursor> {
            let conn = db.get_connection()?;

            // MAX() keeps the cursor monotonic even if a stale pass finishes last.
            conn.execute(
                "INSERT INTO sync_cursors (user_id, last_synced_at, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                     last_synced_at = MAX(sync_cursors.last_synced_at, excluded.last_synced_at),
                     updated_at = excluded.updated_at",
                params![user.get(), at.timestamp(), Utc::now().timestamp()],
            )
            .map_err(map_sql_error)?;

            let cursor = conn
                .query_row(
                    "SELECT last_synced_at FROM sync_cursors WHERE user_id = ?1",
                    params![user.get()],
                    |row| Ok(SyncCursor { user_id: user, last_synced_at: column_ts(row, 0)? }),
                )
                .map_err(map_sql_error)?;

            debug!(cursor = %cursor.last_synced_at, "sync cursor advanced");
            Ok(cursor)
        })
        .await
        .map_err(map_join_error)?
    }
}
