//! Shared test helpers for `almanac-core` integration tests.
//!
//! In-memory implementations of every port so the service tests can focus
//! on behaviour instead of storage or HTTP.

#![allow(dead_code)]

pub mod remote;
pub mod repositories;

use almanac_domain::{OAuthCredential, UserId};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub use remote::{FakeRemoteCalendar, RecordingNotifier};
pub use repositories::{InMemoryCursorRepository, InMemoryEventRepository, InMemoryTokenRepository};

/// Fixed reference instant used across tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap()
}

pub fn credential(user: UserId) -> OAuthCredential {
    OAuthCredential {
        user_id: user,
        access_token: format!("access-{user}"),
        refresh_token: Some(format!("refresh-{user}")),
        token_type: "Bearer".into(),
        expires_at: t0() + Duration::hours(1),
    }
}
