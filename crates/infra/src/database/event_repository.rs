//! SQLite-backed implementation of the EventRepository port.

use std::sync::Arc;

use almanac_core::EventRepository;
use almanac_domain::{AlmanacError, Event, Result, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;
use tracing::{debug, instrument};

use super::manager::{column_ts, map_join_error, map_sql_error, DbManager};

const EVENT_COLUMNS: &str = "id, user_id, title, description, start_ts, end_ts, created_at,
     reminder_sent, remote_event_id";

/// SQLite implementation of `EventRepository`
pub struct SqliteEventRepository {
    db: Arc<DbManager>,
}

impl SqliteEventRepository {
    /// Create a new event repository
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    #[instrument(skip(self, event), fields(event_id = %event.id, user = %event.user_id))]
    async fn insert(&self, event: &Event) -> Result<()> {
        let db = Arc::clone(&self.db);
        let event = event.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO events (id, user_id, title, description, start_ts, end_ts,
                                     created_at, reminder_sent, remote_event_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    event.id,
                    event.user_id.get(),
                    event.title,
                    event.description,
                    event.start.timestamp(),
                    event.end.timestamp(),
                    event.created_at.timestamp(),
                    event.reminder_sent,
                    event.remote_event_id,
                ],
            )
            .map_err(map_sql_error)?;
            debug!("event row inserted");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self, event), fields(event_id = %event.id, user = %event.user_id))]
    async fn update(&self, event: &Event) -> Result<()> {
        let db = Arc::clone(&self.db);
        let event = event.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE events
                     SET title = ?1, description = ?2, start_ts = ?3, end_ts = ?4,
                         reminder_sent = ?5
                     WHERE id = ?6 AND user_id = ?7",
                    params![
                        event.title,
                        event.description,
                        event.start.timestamp(),
                        event.end.timestamp(),
                        event.reminder_sent,
                        event.id,
                        event.user_id.get(),
                    ],
                )
                .map_err(map_sql_error)?;

            if changed == 0 {
                return Err(AlmanacError::NotFound(format!("event {}", event.id)));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn get(&self, user: UserId, id: &str) -> Result<Option<Event>> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> Result<Option<Event>> {
            let conn = db.get_connection()?;
            conn.query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1 AND user_id = ?2"),
                params![id, user.get()],
                map_event_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn find_by_remote_id(&self, user: UserId, remote_id: &str) -> Result<Option<Event>> {
        let db = Arc::clone(&self.db);
        let remote_id = remote_id.to_string();

        task::spawn_blocking(move || -> Result<Option<Event>> {
            let conn = db.get_connection()?;
            conn.query_row(
                &format!(
                    "SELECT {EVENT_COLUMNS} FROM events WHERE user_id = ?1 AND remote_event_id = ?2"
                ),
                params![user.get(), remote_id],
                map_event_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn list_by_range(
        &self,
        user: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<Event>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {EVENT_COLUMNS} FROM events
                     WHERE user_id = ?1 AND start_ts >= ?2 AND start_ts <= ?3
                     ORDER BY start_ts, id"
                ))
                .map_err(map_sql_error)?;

            let events = stmt
                .query_map(params![user.get(), from.timestamp(), to.timestamp()], map_event_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;

            debug!(count = events.len(), "events listed");
            Ok(events)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn delete(&self, user: UserId, id: &str) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let removed = conn
                .execute("DELETE FROM events WHERE id = ?1 AND user_id = ?2", params![id, user.get()])
                .map_err(map_sql_error)?;
            Ok(removed > 0)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn set_remote_id(&self, user: UserId, id: &str, remote_id: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        let remote_id = remote_id.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE events SET remote_event_id = ?1 WHERE id = ?2 AND user_id = ?3",
                    params![remote_id, id, user.get()],
                )
                .map_err(map_sql_error)?;

            if changed == 0 {
                return Err(AlmanacError::NotFound(format!("event {id}")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn find_due_reminders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<Event>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {EVENT_COLUMNS} FROM events
                     WHERE reminder_sent = 0 AND start_ts >= ?1 AND start_ts <= ?2
                     ORDER BY start_ts, id"
                ))
                .map_err(map_sql_error)?;

            let events = stmt
                .query_map(params![from.timestamp(), to.timestamp()], map_event_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(events)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn mark_reminder_sent(
        &self,
        user: UserId,
        id: &str,
        start: DateTime<Utc>,
    ) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE events SET reminder_sent = 1
                     WHERE id = ?1 AND user_id = ?2 AND start_ts = ?3",
                    params![id, user.get(), start.timestamp()],
                )
                .map_err(map_sql_error)?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_event_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        user_id: UserId(row.get(1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        start: column_ts(row, 4)?,
        end: column_ts(row, 5)?,
        created_at: column_ts(row, 6)?,
        reminder_sent: row.get(7)?,
        remote_event_id: row.get(8)?,
    })
}
