//! Reminder dispatch and notification port

pub mod ports;
pub mod service;

pub use service::{format_reminder, ReminderService};
