//! Event CRUD façade with best-effort remote mirroring

use std::sync::Arc;

use almanac_domain::utils::time::day_bounds;
use almanac_domain::{AlmanacError, Event, EventDraft, Result, UserId};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, instrument, warn};

use super::ports::{EventRepository, RemoteCalendar};
use crate::auth::ports::TokenRepository;

/// Whether local writes are mirrored to the remote calendar.
#[derive(Clone)]
pub enum RemoteMirror {
    Disabled,
    /// Mirror for users that have a stored credential.
    Enabled { remote: Arc<dyn RemoteCalendar>, tokens: Arc<dyn TokenRepository> },
}

impl RemoteMirror {
    pub fn enabled(remote: Arc<dyn RemoteCalendar>, tokens: Arc<dyn TokenRepository>) -> Self {
        Self::Enabled { remote, tokens }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }
}

/// Calendar service used by collaborators (assistant, commands, UI).
///
/// The local store is the source of truth. Remote mirroring never fails a
/// call: errors are logged and the local write stands.
pub struct CalendarService {
    events: Arc<dyn EventRepository>,
    mirror: RemoteMirror,
    timezone: Tz,
}

impl CalendarService {
    pub fn new(events: Arc<dyn EventRepository>, mirror: RemoteMirror) -> Self {
        Self { events, mirror, timezone: Tz::UTC }
    }

    /// Timezone for naive input times and day boundaries
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Create an event and mirror it if the user has authorized.
    #[instrument(skip(self, draft), fields(user = %user))]
    pub async fn create_event(&self, user: UserId, draft: EventDraft) -> Result<Event> {
        let fields = draft.validate(self.timezone)?;
        let mut event = Event::new(user, fields, Utc::now());

        self.events.insert(&event).await?;
        debug!(event_id = %event.id, "event created");

        if let Some(remote) = self.remote_for(user).await {
            match remote.create_event(user, &event).await {
                Ok(remote_id) => match self.record_remote_id(&mut event, &remote_id).await {
                    Ok(()) => event.remote_event_id = Some(remote_id),
                    Err(e) => warn!(
                        event_id = %event.id,
                        remote_id = %remote_id,
                        error = %e,
                        "failed to record remote id for mirrored event"
                    ),
                },
                Err(e) => warn!(event_id = %event.id, error = %e, "remote create failed"),
            }
        }

        Ok(event)
    }

    /// Attach `remote_id` to a freshly mirrored event.
    ///
    /// A sync pass running between the remote create and this call may
    /// already have materialized the remote item as a separate row. That
    /// twin is folded into `event` so only one local copy remains.
    async fn record_remote_id(&self, event: &mut Event, remote_id: &str) -> Result<()> {
        let user = event.user_id;
        let Err(err) = self.events.set_remote_id(user, &event.id, remote_id).await else {
            return Ok(());
        };

        let twin = match self.events.find_by_remote_id(user, remote_id).await? {
            Some(twin) if twin.id != event.id => twin,
            _ => return Err(err),
        };

        self.events.delete(user, &twin.id).await?;
        if twin.reminder_sent && twin.start == event.start && !event.reminder_sent {
            event.reminder_sent = true;
            self.events.update(event).await?;
        }
        debug!(
            event_id = %event.id,
            twin_id = %twin.id,
            remote_id,
            "dropped copy pulled by a concurrent sync"
        );

        self.events.set_remote_id(user, &event.id, remote_id).await
    }

    pub async fn get_event(&self, user: UserId, id: &str) -> Result<Event> {
        self.events
            .get(user, id)
            .await?
            .ok_or_else(|| AlmanacError::NotFound(format!("event {id}")))
    }

    /// Events starting within `window` from now.
    pub async fn list_upcoming(&self, user: UserId, window: Duration) -> Result<Vec<Event>> {
        self.list_upcoming_at(user, Utc::now(), window).await
    }

    pub async fn list_upcoming_at(
        &self,
        user: UserId,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<Vec<Event>> {
        if window < Duration::zero() {
            return Err(AlmanacError::InvalidInput("window must not be negative".into()));
        }
        self.events.list_by_range(user, now, now + window).await
    }

    /// Events starting on `date` in the display timezone.
    pub async fn list_by_day(&self, user: UserId, date: NaiveDate) -> Result<Vec<Event>> {
        let (start, end) = day_bounds(date, self.timezone)?;
        // Stored at second precision, so this makes the range half-open.
        self.events.list_by_range(user, start, end - Duration::seconds(1)).await
    }

    pub async fn list_by_range(
        &self,
        user: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        check_range(start, end)?;
        self.events.list_by_range(user, start, end).await
    }

    /// Overwrite an event. Moving its start re-arms the reminder.
    #[instrument(skip(self, draft), fields(user = %user))]
    pub async fn update_event(&self, user: UserId, id: &str, draft: EventDraft) -> Result<Event> {
        let fields = draft.validate(self.timezone)?;
        let mut event = self.get_event(user, id).await?;

        if event.apply(fields) {
            self.events.update(&event).await?;
            debug!(event_id = %event.id, "event updated");
        }

        if let Some(remote) = self.remote_for(user).await {
            match event.remote_event_id.as_deref() {
                Some(remote_id) => {
                    if let Err(e) = remote.update_event(user, remote_id, &event).await {
                        warn!(event_id = %event.id, remote_id, error = %e, "remote update failed");
                    }
                }
                None => warn!(event_id = %event.id, "event has no remote id; skipping remote update"),
            }
        }

        Ok(event)
    }

    #[instrument(skip(self), fields(user = %user))]
    pub async fn delete_event(&self, user: UserId, id: &str) -> Result<()> {
        let event = self.get_event(user, id).await?;

        if !self.events.delete(user, id).await? {
            return Err(AlmanacError::NotFound(format!("event {id}")));
        }
        debug!(event_id = %id, "event deleted");

        if let Some(remote_id) = event.remote_event_id.as_deref() {
            if let Some(remote) = self.remote_for(user).await {
                if let Err(e) = remote.delete_event(user, remote_id).await {
                    warn!(event_id = %id, remote_id, error = %e, "remote delete failed");
                }
            }
        }

        Ok(())
    }

    /// Delete every event starting in `[start, end]`.
    ///
    /// Returns the number of local deletions. A failing event is logged and
    /// skipped; remote failures do not reduce the count.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn delete_by_range(
        &self,
        user: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<usize> {
        let events = self.list_by_range(user, start, end).await?;
        let mut deleted = 0;

        for event in &events {
            match self.delete_event(user, &event.id).await {
                Ok(()) => deleted += 1,
                Err(e) => warn!(event_id = %event.id, error = %e, "failed to delete event in range"),
            }
        }

        debug!(listed = events.len(), deleted, "range delete finished");
        Ok(deleted)
    }

    async fn remote_for(&self, user: UserId) -> Option<&Arc<dyn RemoteCalendar>> {
        let RemoteMirror::Enabled { remote, tokens } = &self.mirror else {
            return None;
        };

        match tokens.get(user).await {
            Ok(Some(_)) => Some(remote),
            Ok(None) => {
                debug!(user = %user, "no credential stored; not mirroring");
                None
            }
            Err(e) => {
                warn!(user = %user, error = %e, "failed to load credential; not mirroring");
                None
            }
        }
    }
}

fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if start > end {
        return Err(AlmanacError::InvalidInput(format!(
            "range start {} is after end {}",
            start.to_rfc3339(),
            end.to_rfc3339()
        )));
    }
    Ok(())
}
