//! OAuth credential storage
//!
//! One row per user. Upserts overwrite everything except a stored refresh
//! token, which survives a write that carries none.

use std::sync::Arc;

use almanac_core::TokenRepository;
use almanac_domain::{OAuthCredential, Result, UserId};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tokio::task;
use tracing::{debug, instrument};

use super::manager::{column_ts, map_join_error, map_sql_error, DbManager};

/// SQLite implementation of `TokenRepository`
pub struct SqliteTokenRepository {
    db: Arc<DbManager>,
}

impl SqliteTokenRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenRepository for SqliteTokenRepository {
    #[instrument(skip(self))]
    async fn get(&self, user: UserId) -> Result<Option<OAuthCredential>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Option<OAuthCredential>> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT user_id, access_token, refresh_token, token_type, expires_at
                 FROM oauth_tokens WHERE user_id = ?1",
                params![user.get()],
                |row| {
                    Ok(OAuthCredential {
                        user_id: UserId(row.get(0)?),
                        access_token: row.get(1)?,
                        refresh_token: row.get(2)?,
                        token_type: row.get(3)?,
                        expires_at: column_ts(row, 4)?,
                    })
                },
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self, credential), fields(user = %credential.user_id))]
    async fn upsert(&self, credential: &OAuthCredential) -> Result<()> {
        let db = Arc::clone(&self.db);
        let credential = credential.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO oauth_tokens (user_id, access_token, refresh_token, token_type,
                                           expires_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id) DO UPDATE SET
                     access_token = excluded.access_token,
                     refresh_token = COALESCE(excluded.refresh_token, oauth_tokens.refresh_token),
                     token_type = excluded.token_type,
                     expires_at = excluded.expires_at,
                     updated_at = excluded.updated_at",
                params![
                    credential.user_id.get(),
                    credential.access_token,
                    credential.refresh_token,
                    credential.token_type,
                    credential.expires_at.timestamp(),
                    Utc::now().timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            debug!("credential stored");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserId>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<UserId>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare("SELECT user_id FROM oauth_tokens ORDER BY user_id")
                .map_err(map_sql_error)?;
            let users = stmt
                .query_map([], |row| row.get::<_, i64>(0).map(UserId))
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(users)
        })
        .await
        .map_err(map_join_error)?
    }
}
