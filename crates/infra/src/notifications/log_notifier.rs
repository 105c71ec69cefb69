use almanac_core::Notifier;
use almanac_domain::{Result, UserId};
use async_trait::async_trait;
use tracing::info;

/// Writes reminders to the log. Used when no delivery channel is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, user: UserId, message: &str) -> Result<()> {
        info!(user = %user, message, "reminder");
        Ok(())
    }
}
