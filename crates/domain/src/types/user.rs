//! User identity

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AlmanacError, Result};

/// Identifier of the user owning events, credentials and sync cursors.
///
/// Issued by the registration subsystem; this crate never creates users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Raw numeric value, as stored in the database.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = AlmanacError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|e| AlmanacError::InvalidInput(format!("invalid user id '{s}': {e}")))
    }
}
