//! # Almanac Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite repositories for events, OAuth credentials and sync cursors
//! - The Google OAuth and Calendar v3 clients, plus the OAuth callback route
//! - Reminder notifiers (webhook, log)
//! - Cron and interval schedulers for sync and reminders
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `almanac-core`
//! - Contains all "impure" code (I/O, network, timers)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod notifications;
pub mod observability;
pub mod scheduling;

// Re-export commonly used items
pub use database::{
    DbManager, SqliteEventRepository, SqliteSyncCursorRepository, SqliteTokenRepository,
};
pub use errors::InfraError;
pub use http::HttpClient;
pub use integrations::calendar::{GoogleCalendarClient, GoogleOAuthClient};
pub use notifications::{notifier_from_config, LogNotifier, WebhookNotifier};
pub use scheduling::{CalendarSyncScheduler, ReminderScheduler, SchedulerError};
