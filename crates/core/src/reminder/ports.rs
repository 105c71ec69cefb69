//! Port interfaces for reminder delivery

use almanac_domain::{Result, UserId};
use async_trait::async_trait;

/// Outbound notification channel (messaging platform, webhook, log).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message to a user. An error means the message was not
    /// delivered and may be retried.
    async fn notify(&self, user: UserId, message: &str) -> Result<()>;
}
