//! Pull-based reconciliation of remote changes into the local store
//!
//! Each pass pulls remote items changed since the user's cursor (or a bounded
//! window on first sync), applies them one by one and then advances the
//! cursor to the instant the pass started. Applying the same snapshot twice
//! leaves the store unchanged.

use std::sync::Arc;

use almanac_domain::constants::{FIRST_SYNC_LOOKAHEAD_DAYS, FIRST_SYNC_LOOKBACK_DAYS};
use almanac_domain::{
    AlmanacError, Event, RemoteEvent, RemoteQuery, Result, SweepReport, SyncReport, UserId,
};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, instrument, warn};

use crate::auth::ports::{SyncCursorRepository, TokenRepository};
use crate::calendar::ports::{EventRepository, RemoteCalendar};

/// What applying a single remote item did to the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Created,
    Updated,
    Deleted,
    Unchanged,
}

/// Calendar sync engine
pub struct SyncEngine {
    events: Arc<dyn EventRepository>,
    remote: Arc<dyn RemoteCalendar>,
    tokens: Arc<dyn TokenRepository>,
    cursors: Arc<dyn SyncCursorRepository>,
}

impl SyncEngine {
    pub fn new(
        events: Arc<dyn EventRepository>,
        remote: Arc<dyn RemoteCalendar>,
        tokens: Arc<dyn TokenRepository>,
        cursors: Arc<dyn SyncCursorRepository>,
    ) -> Self {
        Self { events, remote, tokens, cursors }
    }

    /// Run one sync pass for `user` now.
    pub async fn sync_user(&self, user: UserId) -> Result<SyncReport> {
        self.sync_user_at(user, Utc::now()).await
    }

    /// Run one sync pass for `user` as of `now`.
    ///
    /// 1. Resolve the cursor (absent means first sync)
    /// 2. Pull remote items (window or updated-since)
    /// 3. Apply each item; bad items are logged and skipped
    /// 4. Advance the cursor to `now`
    ///
    /// A failed pull aborts the pass without touching the cursor.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn sync_user_at(&self, user: UserId, now: DateTime<Utc>) -> Result<SyncReport> {
        if self.tokens.get(user).await?.is_none() {
            return Err(AlmanacError::AuthRequired(format!(
                "user {user} has not authorized calendar access"
            )));
        }

        let cursor = self.cursors.get(user).await?;
        let query = match cursor {
            Some(cursor) => RemoteQuery::UpdatedSince { updated_min: cursor.last_synced_at },
            None => RemoteQuery::Window {
                time_min: now - Duration::days(FIRST_SYNC_LOOKBACK_DAYS),
                time_max: now + Duration::days(FIRST_SYNC_LOOKAHEAD_DAYS),
            },
        };

        let mut report = SyncReport { first_sync: cursor.is_none(), ..SyncReport::default() };
        debug!(first_sync = report.first_sync, ?query, "pulling remote changes");

        let items = self.remote.list_events(user, &query).await?;
        report.fetched = items.len();

        for item in &items {
            match self.apply_item(user, item, now).await {
                Ok(ItemOutcome::Created) => report.created += 1,
                Ok(ItemOutcome::Updated) => report.updated += 1,
                Ok(ItemOutcome::Deleted) => report.deleted += 1,
                Ok(ItemOutcome::Unchanged) => report.unchanged += 1,
                Err(e) => {
                    warn!(remote_id = %item.id, error = %e, "skipping remote item");
                    report.skipped += 1;
                }
            }
        }

        let advanced = self.cursors.advance(user, now).await?;
        report.cursor = Some(advanced.last_synced_at);

        info!(
            first_sync = report.first_sync,
            fetched = report.fetched,
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            skipped = report.skipped,
            "calendar sync completed"
        );

        Ok(report)
    }

    /// Apply one remote item to the local store.
    pub async fn apply_item(
        &self,
        user: UserId,
        item: &RemoteEvent,
        now: DateTime<Utc>,
    ) -> Result<ItemOutcome> {
        let existing = self.events.find_by_remote_id(user, &item.id).await?;

        if item.is_cancelled() {
            return match existing {
                Some(event) => {
                    self.events.delete(user, &event.id).await?;
                    debug!(remote_id = %item.id, event_id = %event.id, "deleted cancelled event");
                    Ok(ItemOutcome::Deleted)
                }
                None => Ok(ItemOutcome::Unchanged),
            };
        }

        let fields = item.to_fields()?;

        match existing {
            Some(mut event) => {
                if !event.apply(fields) {
                    return Ok(ItemOutcome::Unchanged);
                }
                self.events.update(&event).await?;
                debug!(remote_id = %item.id, event_id = %event.id, "updated event from remote");
                Ok(ItemOutcome::Updated)
            }
            None => {
                let mut event = Event::new(user, fields, now);
                event.remote_event_id = Some(item.id.clone());
                self.events.insert(&event).await?;
                debug!(remote_id = %item.id, event_id = %event.id, "materialized remote event");
                Ok(ItemOutcome::Created)
            }
        }
    }

    /// Sync every user with a stored credential, one after another.
    pub async fn sync_all(&self) -> Result<SweepReport> {
        self.sync_all_at(Utc::now()).await
    }

    /// Sweep as of `now`. A user's failure is logged and never stops the sweep.
    #[instrument(skip(self))]
    pub async fn sync_all_at(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let users = self.tokens.list_users().await?;
        let mut sweep = SweepReport { users: users.len(), ..SweepReport::default() };

        for user in users {
            match self.sync_user_at(user, now).await {
                Ok(_) => sweep.succeeded += 1,
                Err(e) if e.is_auth() => {
                    warn!(user = %user, error = %e, "calendar authorization needs renewal");
                    sweep.failed += 1;
                    sweep.auth_failures += 1;
                }
                Err(e) => {
                    error!(user = %user, error = %e, "calendar sync failed");
                    sweep.failed += 1;
                }
            }
        }

        info!(
            users = sweep.users,
            succeeded = sweep.succeeded,
            failed = sweep.failed,
            "calendar sweep finished"
        );
        Ok(sweep)
    }
}
