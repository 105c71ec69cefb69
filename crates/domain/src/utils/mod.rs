//! Pure helper functions

pub mod time;

pub use time::{day_bounds, parse_remote_date, parse_remote_datetime, parse_user_time};
