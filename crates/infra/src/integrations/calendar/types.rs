//! Google Calendar v3 wire types
//!
//! Only the fields the sync engine reads or writes are modelled; everything
//! else in the provider payload is ignored.

use almanac_domain::{Event, RemoteEvent, RemoteEventStatus, RemoteTime};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Time zone sent with every outgoing timestamp.
pub const OUTGOING_TIME_ZONE: &str = "UTC";

/// `start` / `end` object: `date` for all-day items, `dateTime` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl GoogleEventTime {
    pub fn utc(at: DateTime<Utc>) -> Self {
        Self {
            date: None,
            date_time: Some(at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            time_zone: Some(OUTGOING_TIME_ZONE.to_string()),
        }
    }

    fn into_remote(self) -> Option<RemoteTime> {
        match (self.date_time, self.date) {
            (Some(ts), _) => Some(RemoteTime::DateTime(ts)),
            (None, Some(date)) => Some(RemoteTime::Date(date)),
            (None, None) => None,
        }
    }
}

/// Event resource as returned by the provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start: Option<GoogleEventTime>,
    #[serde(default)]
    pub end: Option<GoogleEventTime>,
    #[serde(default)]
    pub updated: Option<String>,
}

impl GoogleEvent {
    /// Convert into the provider-neutral form. Items without an id cannot be
    /// correlated and yield `None`.
    pub fn into_remote(self) -> Option<RemoteEvent> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let status = self
            .status
            .as_deref()
            .and_then(|s| s.parse::<RemoteEventStatus>().ok())
            .unwrap_or_default();
        let updated = self
            .updated
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc));

        Some(RemoteEvent {
            id,
            status,
            summary: self.summary,
            description: self.description,
            start: self.start.and_then(GoogleEventTime::into_remote),
            end: self.end.and_then(GoogleEventTime::into_remote),
            updated,
        })
    }
}

/// One page of an events listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventList {
    #[serde(default)]
    pub items: Vec<GoogleEvent>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Request body for insert and update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventBody {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: GoogleEventTime,
    pub end: GoogleEventTime,
}

impl From<&Event> for GoogleEventBody {
    fn from(event: &Event) -> Self {
        Self {
            summary: event.title.clone(),
            description: event.description.clone(),
            start: GoogleEventTime::utc(event.start),
            end: GoogleEventTime::utc(event.end),
        }
    }
}
