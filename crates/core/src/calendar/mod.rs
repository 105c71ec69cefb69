//! Event store façade and remote calendar ports

pub mod ports;
pub mod service;

pub use service::{CalendarService, RemoteMirror};
