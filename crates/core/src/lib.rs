//! # Almanac Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits)
//! - The event CRUD façade with remote mirroring
//! - The sync engine and the reminder service
//!
//! ## Architecture Principles
//! - Only depends on `almanac-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod auth;
pub mod calendar;
pub mod reminder;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use auth::ports::{SyncCursorRepository, TokenRepository};
pub use calendar::ports::{EventRepository, RemoteCalendar};
pub use calendar::{CalendarService, RemoteMirror};
pub use reminder::ports::Notifier;
pub use reminder::ReminderService;
pub use sync::{ItemOutcome, SyncEngine};
