//! Provider-neutral view of remote calendar items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EventFields;
use crate::constants::UNTITLED_EVENT;
use crate::impl_domain_status_conversions;
use crate::utils::time::{parse_remote_date, parse_remote_datetime};
use crate::{AlmanacError, Result};

/// Remote event lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteEventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

impl_domain_status_conversions!(RemoteEventStatus {
    Confirmed => "confirmed",
    Tentative => "tentative",
    Cancelled => "cancelled",
});

impl RemoteEventStatus {
    pub fn is_cancelled(self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Start or end of a remote item, as sent by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteTime {
    /// All-day `YYYY-MM-DD`.
    Date(String),
    /// RFC 3339 timestamp.
    DateTime(String),
}

impl RemoteTime {
    /// All-day dates resolve to midnight UTC.
    pub fn to_utc(&self, field: &str) -> Result<DateTime<Utc>> {
        match self {
            Self::Date(date) => parse_remote_date(date, field),
            Self::DateTime(ts) => parse_remote_datetime(ts, field),
        }
    }
}

/// One item returned by a remote listing.
///
/// Cancelled items typically carry only `id` and `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    pub status: RemoteEventStatus,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: Option<RemoteTime>,
    pub end: Option<RemoteTime>,
    pub updated: Option<DateTime<Utc>>,
}

impl RemoteEvent {
    pub fn is_cancelled(&self) -> bool {
        self.status.is_cancelled()
    }

    /// Resolve the item into local event fields.
    ///
    /// # Errors
    /// `InvalidInput` when a time is missing or malformed, or `start > end`.
    pub fn to_fields(&self) -> Result<EventFields> {
        let start = self
            .start
            .as_ref()
            .ok_or_else(|| AlmanacError::InvalidInput(format!("remote event {} has no start", self.id)))?
            .to_utc("start")?;
        let end = self
            .end
            .as_ref()
            .ok_or_else(|| AlmanacError::InvalidInput(format!("remote event {} has no end", self.id)))?
            .to_utc("end")?;

        let title = self
            .summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNTITLED_EVENT);

        EventFields::new(title, self.description.clone(), start, end)
    }
}

/// Server-side filter for a remote listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteQuery {
    /// Items overlapping `[time_min, time_max)`; used on first sync.
    Window { time_min: DateTime<Utc>, time_max: DateTime<Utc> },
    /// Items modified at or after `updated_min`, including deletions.
    UpdatedSince { updated_min: DateTime<Utc> },
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn item(start: RemoteTime, end: RemoteTime) -> RemoteEvent {
        RemoteEvent {
            id: "g1".into(),
            status: RemoteEventStatus::Confirmed,
            summary: Some("Offsite".into()),
            description: None,
            start: Some(start),
            end: Some(end),
            updated: None,
        }
    }

    #[test]
    fn all_day_item_resolves_to_midnight_utc() {
        let fields = item(RemoteTime::Date("2025-03-01".into()), RemoteTime::Date("2025-03-02".into()))
            .to_fields()
            .unwrap();

        assert_eq!(fields.start.to_rfc3339(), "2025-03-01T00:00:00+00:00");
        assert_eq!(fields.end.to_rfc3339(), "2025-03-02T00:00:00+00:00");
    }

    #[test]
    fn inverted_item_is_rejected() {
        let result = item(
            RemoteTime::DateTime("2025-03-01T10:00:00Z".into()),
            RemoteTime::DateTime("2025-03-01T09:00:00Z".into()),
        )
        .to_fields();
        assert!(matches!(result, Err(AlmanacError::InvalidInput(_))));
    }

    #[test]
    fn missing_summary_gets_placeholder_title() {
        let mut event = item(
            RemoteTime::DateTime("2025-03-01T09:00:00Z".into()),
            RemoteTime::DateTime("2025-03-01T10:00:00Z".into()),
        );
        event.summary = None;
        assert_eq!(event.to_fields().unwrap().title, UNTITLED_EVENT);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(RemoteEventStatus::from_str("CANCELLED").unwrap(), RemoteEventStatus::Cancelled);
        assert!(RemoteEventStatus::Cancelled.is_cancelled());
        assert!(!RemoteEventStatus::Tentative.is_cancelled());
        assert!(RemoteEventStatus::from_str("deleted").is_err());
    }
}
