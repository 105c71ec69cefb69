//! Background schedulers
//!
//! - Calendar sync sweep (cron, `tokio-cron-scheduler`)
//! - Reminder dispatch (fixed interval loop)
//!
//! Both expose `start`/`stop`/`is_running` and a `run_once` entry point that
//! performs a single pass synchronously.

pub mod calendar_scheduler;
pub mod error;
pub mod reminder_scheduler;

pub use calendar_scheduler::{CalendarSyncScheduler, CalendarSyncSchedulerConfig};
pub use error::{SchedulerError, SchedulerResult};
pub use reminder_scheduler::{ReminderScheduler, ReminderSchedulerConfig};
