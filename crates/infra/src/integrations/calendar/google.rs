//! Google Calendar v3 implementation of the `RemoteCalendar` port.

use std::sync::Arc;

use almanac_core::RemoteCalendar;
use almanac_domain::constants::PRIMARY_CALENDAR_ID;
use almanac_domain::{AlmanacError, Event, RemoteEvent, RemoteQuery, Result, UserId};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::oauth::GoogleOAuthClient;
use super::types::{GoogleEvent, GoogleEventBody, GoogleEventList};
use crate::errors::status_error;

const PAGE_SIZE: &str = "250";

/// Remote calendar client for the user's primary Google calendar.
pub struct GoogleCalendarClient {
    oauth: Arc<GoogleOAuthClient>,
    base_url: Url,
    calendar_id: String,
}

impl GoogleCalendarClient {
    /// Build a client against the API base URL configured on the OAuth client.
    pub fn new(oauth: Arc<GoogleOAuthClient>) -> Result<Self> {
        let base_url = Url::parse(&oauth.config().api_base_url).map_err(|err| {
            AlmanacError::Config(format!("invalid calendar API base URL: {err}"))
        })?;

        Ok(Self { oauth, base_url, calendar_id: PRIMARY_CALENDAR_ID.to_string() })
    }

    /// `{base}/calendars/{calendar}/events[/{event}]`
    fn events_url(&self, event_id: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AlmanacError::Config("calendar API base URL cannot carry a path".into())
            })?;
            segments.pop_if_empty().extend(["calendars", self.calendar_id.as_str(), "events"]);
            if let Some(id) = event_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn list_url(&self, query: &RemoteQuery, page_token: Option<&str>) -> Result<Url> {
        let mut url = self.events_url(None)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("singleEvents", "true");
            pairs.append_pair("maxResults", PAGE_SIZE);
            match query {
                RemoteQuery::Window { time_min, time_max } => {
                    pairs.append_pair("timeMin", &rfc3339(*time_min));
                    pairs.append_pair("timeMax", &rfc3339(*time_max));
                }
                RemoteQuery::UpdatedSince { updated_min } => {
                    pairs.append_pair("updatedMin", &rfc3339(*updated_min));
                    pairs.append_pair("showDeleted", "true");
                }
            }
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl RemoteCalendar for GoogleCalendarClient {
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    async fn create_event(&self, user: UserId, event: &Event) -> Result<String> {
        let transport = self.oauth.authenticated_transport(user).await?;
        let url = self.events_url(None)?;

        let response = transport
            .send_checked(transport.request(Method::POST, url).json(&GoogleEventBody::from(event)))
            .await?;
        let created: GoogleEvent = decode(response).await?;

        let remote_id = created
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AlmanacError::RemoteUnavailable("created event has no id".into()))?;
        debug!(remote_id = %remote_id, "remote event created");
        Ok(remote_id)
    }

    #[instrument(skip(self, event), fields(event_id = %event.id))]
    async fn update_event(&self, user: UserId, remote_id: &str, event: &Event) -> Result<()> {
        let transport = self.oauth.authenticated_transport(user).await?;
        let url = self.events_url(Some(remote_id))?;

        transport
            .send_checked(transport.request(Method::PUT, url).json(&GoogleEventBody::from(event)))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_event(&self, user: UserId, remote_id: &str) -> Result<()> {
        let transport = self.oauth.authenticated_transport(user).await?;
        let url = self.events_url(Some(remote_id))?;

        let response = transport.send(transport.request(Method::DELETE, url)).await?;
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            debug!(%status, "remote event already gone");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, body))
    }

    #[instrument(skip(self))]
    async fn list_events(&self, user: UserId, query: &RemoteQuery) -> Result<Vec<RemoteEvent>> {
        let transport = self.oauth.authenticated_transport(user).await?;

        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let url = self.list_url(query, page_token.as_deref())?;
            let response = transport.send_checked(transport.request(Method::GET, url)).await?;
            let page: GoogleEventList = decode(response).await?;
            pages += 1;

            for item in page.items {
                match item.into_remote() {
                    Some(remote) => items.push(remote),
                    None => warn!("remote item without id ignored"),
                }
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                    warn!(pages, "provider repeated its page token, stopping pagination");
                    break;
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(pages, count = items.len(), "remote listing complete");
        Ok(items)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|err| AlmanacError::RemoteUnavailable(format!("undecodable provider response: {err}")))
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
