//! Application constants
//!
//! Centralized location for the domain-level defaults shared by the sync
//! engine, the reminder scheduler and configuration.

// First-sync window
pub const FIRST_SYNC_LOOKBACK_DAYS: i64 = 7;
pub const FIRST_SYNC_LOOKAHEAD_DAYS: i64 = 365;

// Reminder scan
pub const REMINDER_INTERVAL_SECS: u64 = 20;
pub const REMINDER_WINDOW_MINUTES: i64 = 60;

// Sync sweep
pub const DEFAULT_SYNC_CRON: &str = "0 */5 * * * *";

// Remote provider
pub const PRIMARY_CALENDAR_ID: &str = "primary";
pub const UNTITLED_EVENT: &str = "Untitled Event";

// Display
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const MAX_TITLE_LENGTH: usize = 1024;
