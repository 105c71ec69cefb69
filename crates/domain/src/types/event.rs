//! Calendar events

use chrono::{DateTime, SubsecRound, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;
use crate::constants::MAX_TITLE_LENGTH;
use crate::utils::time::parse_user_time;
use crate::{AlmanacError, Result};

/// A calendar event owned by a single user.
///
/// `remote_event_id` is the provider-side identifier of the mirrored copy.
/// Once set it is only cleared by deleting the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub reminder_sent: bool,
    pub remote_event_id: Option<String>,
}

impl Event {
    /// Build a fresh event with a time-ordered id.
    pub fn new(user_id: UserId, fields: EventFields, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            user_id,
            title: fields.title,
            description: fields.description,
            start: fields.start,
            end: fields.end,
            created_at: now.trunc_subsecs(0),
            reminder_sent: false,
            remote_event_id: None,
        }
    }

    /// Overwrite the mutable fields.
    ///
    /// Moving the start re-arms the reminder. Re-applying identical fields
    /// leaves the event untouched and returns `false`.
    pub fn apply(&mut self, fields: EventFields) -> bool {
        if self.title == fields.title
            && self.description == fields.description
            && self.start == fields.start
            && self.end == fields.end
        {
            return false;
        }

        if self.start != fields.start {
            self.reminder_sent = false;
        }

        self.title = fields.title;
        self.description = fields.description;
        self.start = fields.start;
        self.end = fields.end;
        true
    }

    pub fn is_mirrored(&self) -> bool {
        self.remote_event_id.is_some()
    }
}

/// Validated, time-resolved event fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFields {
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl EventFields {
    /// # Errors
    /// `InvalidInput` for an empty or oversized title, or `start > end`.
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(AlmanacError::InvalidInput("event title must not be empty".into()));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(AlmanacError::InvalidInput(format!(
                "event title exceeds {MAX_TITLE_LENGTH} characters"
            )));
        }
        if start > end {
            return Err(AlmanacError::InvalidInput(format!(
                "event start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }

        let description = description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());

        // Stored at second precision.
        Ok(Self { title, description, start: start.trunc_subsecs(0), end: end.trunc_subsecs(0) })
    }
}

/// Caller-supplied event data with unparsed times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub start: String,
    pub end: String,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self { title: title.into(), description: None, start: start.into(), end: end.into() }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parse both times (naive values are read in `tz`) and validate.
    pub fn validate(&self, tz: Tz) -> Result<EventFields> {
        let start = parse_user_time(&self.start, tz, "start")?;
        let end = parse_user_time(&self.end, tz, "end")?;
        EventFields::new(self.title.clone(), self.description.clone(), start, end)
    }
}
