use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use almanac_core::{EventRepository, SyncCursorRepository, TokenRepository};
use almanac_domain::{AlmanacError, Event, OAuthCredential, Result, SyncCursor, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// In-memory mock for `EventRepository`.
#[derive(Default, Clone)]
pub struct InMemoryEventRepository {
    events: Arc<Mutex<Vec<Event>>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an event directly, bypassing the service.
    pub fn with_event(self, event: Event) -> Self {
        self.events.lock().unwrap().push(event);
        self
    }

    pub fn all(&self) -> Vec<Event> {
        let mut events = self.events.lock().unwrap().clone();
        events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        events
    }

    pub fn mark_sent(&self, id: &str) {
        for event in self.events.lock().unwrap().iter_mut().filter(|e| e.id == id) {
            event.reminder_sent = true;
        }
    }

    pub fn count_for(&self, user: UserId) -> usize {
        self.events.lock().unwrap().iter().filter(|e| e.user_id == user).count()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn insert(&self, event: &Event) -> Result<()> {
        let mut events = self.events.lock().unwrap();
        if let Some(remote_id) = &event.remote_event_id {
            let duplicate = events.iter().any(|e| {
                e.user_id == event.user_id && e.remote_event_id.as_ref() == Some(remote_id)
            });
            if duplicate {
                return Err(AlmanacError::Database(format!("duplicate remote id {remote_id}")));
            }
        }
        events.push(event.clone());
        Ok(())
    }

    async fn update(&self, event: &Event) -> Result<()> {
        let mut events = self.events.lock().unwrap();
        let stored = events
            .iter_mut()
            .find(|e| e.user_id == event.user_id && e.id == event.id)
            .ok_or_else(|| AlmanacError::NotFound(format!("event {}", event.id)))?;

        stored.title = event.title.clone();
        stored.description = event.description.clone();
        stored.start = event.start;
        stored.end = event.end;
        stored.reminder_sent = event.reminder_sent;
        Ok(())
    }

    async fn get(&self, user: UserId, id: &str) -> Result<Option<Event>> {
        Ok(self.events.lock().unwrap().iter().find(|e| e.user_id == user && e.id == id).cloned())
    }

    async fn find_by_remote_id(&self, user: UserId, remote_id: &str) -> Result<Option<Event>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.user_id == user && e.remote_event_id.as_deref() == Some(remote_id))
            .cloned())
    }

    async fn list_by_range(
        &self,
        user: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        Ok(self
            .all()
            .into_iter()
            .filter(|e| e.user_id == user && e.start >= from && e.start <= to)
            .collect())
    }

    async fn delete(&self, user: UserId, id: &str) -> Result<bool> {
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| !(e.user_id == user && e.id == id));
        Ok(events.len() < before)
    }

    async fn set_remote_id(&self, user: UserId, id: &str, remote_id: &str) -> Result<()> {
        let mut events = self.events.lock().unwrap();
        let taken = events.iter().any(|e| {
            e.user_id == user && e.id != id && e.remote_event_id.as_deref() == Some(remote_id)
        });
        if taken {
            return Err(AlmanacError::Database(format!("duplicate remote id {remote_id}")));
        }
        let stored = events
            .iter_mut()
            .find(|e| e.user_id == user && e.id == id)
            .ok_or_else(|| AlmanacError::NotFound(format!("event {id}")))?;
        stored.remote_event_id = Some(remote_id.to_string());
        Ok(())
    }

    async fn find_due_reminders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        Ok(self
            .all()
            .into_iter()
            .filter(|e| !e.reminder_sent && e.start >= from && e.start <= to)
            .collect())
    }

    async fn mark_reminder_sent(
        &self,
        user: UserId,
        id: &str,
        start: DateTime<Utc>,
    ) -> Result<bool> {
        let mut events = self.events.lock().unwrap();
        match events.iter_mut().find(|e| e.user_id == user && e.id == id && e.start == start) {
            Some(event) => {
                event.reminder_sent = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// In-memory mock for `TokenRepository`.
#[derive(Default, Clone)]
pub struct InMemoryTokenRepository {
    tokens: Arc<Mutex<BTreeMap<UserId, OAuthCredential>>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(self, credential: OAuthCredential) -> Self {
        self.tokens.lock().unwrap().insert(credential.user_id, credential);
        self
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn get(&self, user: UserId) -> Result<Option<OAuthCredential>> {
        Ok(self.tokens.lock().unwrap().get(&user).cloned())
    }

    async fn upsert(&self, credential: &OAuthCredential) -> Result<()> {
        self.tokens.lock().unwrap().insert(credential.user_id, credential.clone());
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserId>> {
        Ok(self.tokens.lock().unwrap().keys().copied().collect())
    }
}

/// In-memory mock for `SyncCursorRepository`, keeping the max like the real store.
#[derive(Default, Clone)]
pub struct InMemoryCursorRepository {
    cursors: Arc<Mutex<BTreeMap<UserId, DateTime<Utc>>>>,
}

impl InMemoryCursorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cursor(self, user: UserId, at: DateTime<Utc>) -> Self {
        self.cursors.lock().unwrap().insert(user, at);
        self
    }

    pub fn current(&self, user: UserId) -> Option<DateTime<Utc>> {
        self.cursors.lock().unwrap().get(&user).copied()
    }
}

#[async_trait]
impl SyncCursorRepository for InMemoryCursorRepository {
    async fn get(&self, user: UserId) -> Result<Option<SyncCursor>> {
        Ok(self.current(user).map(|last_synced_at| SyncCursor { user_id: user, last_synced_at }))
    }

    async fn advance(&self, user: UserId, at: DateTime<Utc>) -> Result<SyncCursor> {
        let mut cursors = self.cursors.lock().unwrap();
        let entry = cursors.entry(user).or_insert(at);
        if at > *entry {
            *entry = at;
        }
        Ok(SyncCursor { user_id: user, last_synced_at: *entry })
    }
}
