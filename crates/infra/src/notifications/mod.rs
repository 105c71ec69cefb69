//! Outbound reminder delivery

pub mod log_notifier;
pub mod webhook;

use std::sync::Arc;

use almanac_core::Notifier;
use almanac_domain::{NotificationConfig, Result};

pub use log_notifier::LogNotifier;
pub use webhook::WebhookNotifier;

/// Pick the notifier for the configured channel: a webhook when a URL is
/// set, otherwise the log.
pub fn notifier_from_config(config: &NotificationConfig) -> Result<Arc<dyn Notifier>> {
    match config.webhook_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => Ok(Arc::new(WebhookNotifier::from_config(url, config)?)),
        None => Ok(Arc::new(LogNotifier)),
    }
}
