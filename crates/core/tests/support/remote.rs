use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use almanac_core::{Notifier, RemoteCalendar};
use almanac_domain::{
    AlmanacError, Event, RemoteEvent, RemoteEventStatus, RemoteQuery, RemoteTime, Result, UserId,
};
use async_trait::async_trait;

#[derive(Default)]
struct RemoteState {
    events: BTreeMap<String, RemoteEvent>,
    next_id: usize,
    delete_calls: usize,
    fail_delete_call: Option<usize>,
    fail_create: bool,
    fail_list: Option<AlmanacError>,
    queries: Vec<RemoteQuery>,
    updates: Vec<String>,
}

/// Scriptable fake of the remote calendar, shared by all users.
#[derive(Default, Clone)]
pub struct FakeRemoteCalendar {
    state: Arc<Mutex<RemoteState>>,
}

impl FakeRemoteCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `event` from subsequent listings.
    pub fn put(&self, event: RemoteEvent) {
        self.state.lock().unwrap().events.insert(event.id.clone(), event);
    }

    /// Make the n-th (1-based) delete call fail.
    pub fn fail_delete_call(&self, n: usize) {
        self.state.lock().unwrap().fail_delete_call = Some(n);
    }

    pub fn fail_creates(&self) {
        self.state.lock().unwrap().fail_create = true;
    }

    pub fn fail_listing(&self, error: AlmanacError) {
        self.state.lock().unwrap().fail_list = Some(error);
    }

    pub fn get(&self, remote_id: &str) -> Option<RemoteEvent> {
        self.state.lock().unwrap().events.get(remote_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().events.len()
    }

    pub fn queries(&self) -> Vec<RemoteQuery> {
        self.state.lock().unwrap().queries.clone()
    }

    pub fn updates(&self) -> Vec<String> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn delete_calls(&self) -> usize {
        self.state.lock().unwrap().delete_calls
    }
}

/// Remote representation of a local event, as the provider would echo it.
pub fn to_remote(id: &str, event: &Event) -> RemoteEvent {
    RemoteEvent {
        id: id.to_string(),
        status: RemoteEventStatus::Confirmed,
        summary: Some(event.title.clone()),
        description: event.description.clone(),
        start: Some(RemoteTime::DateTime(event.start.to_rfc3339())),
        end: Some(RemoteTime::DateTime(event.end.to_rfc3339())),
        updated: None,
    }
}

pub fn timed(id: &str, title: &str, start: &str, end: &str) -> RemoteEvent {
    RemoteEvent {
        id: id.to_string(),
        status: RemoteEventStatus::Confirmed,
        summary: Some(title.to_string()),
        description: None,
        start: Some(RemoteTime::DateTime(start.to_string())),
        end: Some(RemoteTime::DateTime(end.to_string())),
        updated: None,
    }
}

pub fn cancelled(id: &str) -> RemoteEvent {
    RemoteEvent {
        id: id.to_string(),
        status: RemoteEventStatus::Cancelled,
        summary: None,
        description: None,
        start: None,
        end: None,
        updated: None,
    }
}

#[async_trait]
impl RemoteCalendar for FakeRemoteCalendar {
    async fn create_event(&self, _user: UserId, event: &Event) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(AlmanacError::RemoteUnavailable("create rejected".into()));
        }
        state.next_id += 1;
        let id = format!("r{}", state.next_id);
        state.events.insert(id.clone(), to_remote(&id, event));
        Ok(id)
    }

    async fn update_event(&self, _user: UserId, remote_id: &str, event: &Event) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.updates.push(remote_id.to_string());
        state.events.insert(remote_id.to_string(), to_remote(remote_id, event));
        Ok(())
    }

    async fn delete_event(&self, _user: UserId, remote_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls += 1;
        if state.fail_delete_call == Some(state.delete_calls) {
            return Err(AlmanacError::RemoteUnavailable("delete timed out".into()));
        }
        state.events.remove(remote_id);
        Ok(())
    }

    async fn list_events(&self, _user: UserId, query: &RemoteQuery) -> Result<Vec<RemoteEvent>> {
        let mut state = self.state.lock().unwrap();
        state.queries.push(*query);
        if let Some(error) = state.fail_list.clone() {
            return Err(error);
        }
        Ok(state.events.values().cloned().collect())
    }
}

/// Notifier that records deliveries and can be told to fail.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(UserId, String)>>>,
    failing: Arc<Mutex<HashSet<UserId>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, user: UserId) {
        self.failing.lock().unwrap().insert(user);
    }

    pub fn recover(&self, user: UserId) {
        self.failing.lock().unwrap().remove(&user);
    }

    pub fn sent(&self) -> Vec<(UserId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user: UserId, message: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(&user) {
            return Err(AlmanacError::RemoteUnavailable("messaging platform down".into()));
        }
        self.sent.lock().unwrap().push((user, message.to_string()));
        Ok(())
    }
}
