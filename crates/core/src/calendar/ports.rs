//! Port interfaces for the event store and the remote calendar
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use almanac_domain::{Event, RemoteEvent, RemoteQuery, Result, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistence for local events.
///
/// Every lookup is scoped by owner: another user's event is indistinguishable
/// from a missing one.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert a new event
    async fn insert(&self, event: &Event) -> Result<()>;

    /// Overwrite title, description, times and reminder flag.
    ///
    /// Fails with `NotFound` when no row matches `(event.user_id, event.id)`.
    async fn update(&self, event: &Event) -> Result<()>;

    /// Fetch an event by id
    async fn get(&self, user: UserId, id: &str) -> Result<Option<Event>>;

    /// Fetch an event by its provider-side id
    async fn find_by_remote_id(&self, user: UserId, remote_id: &str) -> Result<Option<Event>>;

    /// Events whose start lies in `[from, to]`, ordered by start.
    async fn list_by_range(
        &self,
        user: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>>;

    /// Delete an event, returning whether a row was removed
    async fn delete(&self, user: UserId, id: &str) -> Result<bool>;

    /// Record the provider-side id of a freshly mirrored event
    async fn set_remote_id(&self, user: UserId, id: &str, remote_id: &str) -> Result<()>;

    /// Events of all users with `reminder_sent = false` and start in `[from, to]`
    async fn find_due_reminders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>>;

    /// Flip the reminder flag for the occurrence starting at `start`.
    ///
    /// Returns false when the event no longer exists or has been moved to
    /// another start time, in which case the flag stays clear.
    async fn mark_reminder_sent(
        &self,
        user: UserId,
        id: &str,
        start: DateTime<Utc>,
    ) -> Result<bool>;
}

/// Remote calendar provider, acting on the user's primary calendar.
///
/// Implementations obtain a valid access token for `user` themselves and
/// report `AuthRequired`/`AuthExpired` when they cannot.
#[async_trait]
pub trait RemoteCalendar: Send + Sync {
    /// Create a remote copy and return its provider-side id
    async fn create_event(&self, user: UserId, event: &Event) -> Result<String>;

    /// Overwrite the remote copy
    async fn update_event(&self, user: UserId, remote_id: &str, event: &Event) -> Result<()>;

    /// Delete the remote copy; an already-deleted item is not an error
    async fn delete_event(&self, user: UserId, remote_id: &str) -> Result<()>;

    /// List remote items matching `query`, following pagination
    async fn list_events(&self, user: UserId, query: &RemoteQuery) -> Result<Vec<RemoteEvent>>;
}
