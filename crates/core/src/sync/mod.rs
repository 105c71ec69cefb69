//! Remote-to-local synchronization

pub mod engine;

pub use engine::{ItemOutcome, SyncEngine};
