use std::time::Duration;

use almanac_core::Notifier;
use almanac_domain::{AlmanacError, NotificationConfig, Result, UserId};
use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::http::HttpClient;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    user_id: UserId,
    message: &'a str,
}

/// POSTs `{"user_id": .., "message": ..}` to a fixed URL.
///
/// Any non-2xx response counts as a failed delivery so the reminder is
/// retried on the next tick.
pub struct WebhookNotifier {
    http: HttpClient,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(url: &str, http: HttpClient) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|err| AlmanacError::Config(format!("invalid webhook URL {url}: {err}")))?;
        Ok(Self { http, url })
    }

    pub fn from_config(url: &str, config: &NotificationConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        // Reminders are retried by the next tick; one attempt per tick is enough.
        let http = HttpClient::builder().timeout(timeout).max_attempts(1).build()?;
        Self::new(url, http)
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[instrument(skip(self, message))]
    async fn notify(&self, user: UserId, message: &str) -> Result<()> {
        let payload = WebhookPayload { user_id: user, message };
        self.http
            .send_checked(self.http.request(Method::POST, self.url.clone()).json(&payload))
            .await?;
        debug!("reminder delivered to webhook");
        Ok(())
    }
}
