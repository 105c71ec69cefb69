//! Sync bookkeeping types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Per-user high-water mark of the last completed sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursor {
    pub user_id: UserId,
    pub last_synced_at: DateTime<Utc>,
}

/// Outcome of one user's sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub first_sync: bool,
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub skipped: usize,
    /// Cursor value after the pass.
    pub cursor: Option<DateTime<Utc>>,
}

impl SyncReport {
    pub fn changed(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

/// Outcome of a sweep across all users with credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub users: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Users whose credential could not be refreshed.
    pub auth_failures: usize,
}

/// Outcome of one reminder tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderReport {
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
}
