//! # Almanac Domain
//!
//! Business domain types and models for Almanac.
//!
//! This crate contains:
//! - Domain data types (Event, OAuthCredential, SyncCursor, remote items)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants and time parsing helpers
//!
//! ## Architecture
//! - No dependencies on other Almanac crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
