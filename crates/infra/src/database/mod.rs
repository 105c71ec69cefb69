//! Database implementations

pub mod event_repository;
pub mod manager;
pub mod pool;
pub mod sync_cursor_repository;
pub mod token_repository;

pub use event_repository::*;
pub use manager::DbManager;
pub use pool::*;
pub use sync_cursor_repository::*;
pub use token_repository::*;
