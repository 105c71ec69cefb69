//! Port interfaces for credential and cursor storage

use almanac_domain::{OAuthCredential, Result, SyncCursor, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for persisting OAuth credentials (one per user)
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Load the stored credential for a user
    async fn get(&self, user: UserId) -> Result<Option<OAuthCredential>>;

    /// Insert or overwrite the user's credential
    async fn upsert(&self, credential: &OAuthCredential) -> Result<()>;

    /// Users that have a stored credential, in ascending id order
    async fn list_users(&self) -> Result<Vec<UserId>>;
}

/// Trait for persisting per-user sync cursors
#[async_trait]
pub trait SyncCursorRepository: Send + Sync {
    /// Load the cursor, `None` if the user was never synchronized
    async fn get(&self, user: UserId) -> Result<Option<SyncCursor>>;

    /// Move the cursor forward.
    ///
    /// The stored value becomes `max(stored, at)`; the resulting cursor is
    /// returned.
    async fn advance(&self, user: UserId, at: DateTime<Utc>) -> Result<SyncCursor>;
}
