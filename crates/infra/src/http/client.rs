use std::time::Duration;

use almanac_domain::{AlmanacError, Result};
use reqwest::{Client, IntoUrl, Method, RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::errors::{status_error, InfraError};

const USER_AGENT: &str = concat!("almanac/", env!("CARGO_PKG_VERSION"));

/// Provider transport: one shared connection pool, a per-request timeout,
/// and retries for transient failures.
///
/// A request is tried again after a transport error, a `5xx` or a `429`,
/// sleeping `base_backoff * 2^(n-1)` before the n-th retry. The last
/// response is returned whatever its status; use [`Self::send_checked`] to
/// turn failures into domain errors.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    attempts: u32,
    backoff: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn request(&self, method: Method, url: impl IntoUrl) -> RequestBuilder {
        self.inner.request(method, url)
    }

    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let mut attempt = 1;
        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| AlmanacError::Internal("streaming request body cannot be retried".into()))?
                .build()
                .map_err(InfraError::from)?;
            let target = format!("{} {}", request.method(), request.url().path());
            let final_attempt = attempt >= self.attempts;

            match self.inner.execute(request).await {
                Ok(response) if !final_attempt && is_transient_status(response.status()) => {
                    debug!(attempt, %target, status = %response.status(), "transient status, retrying");
                }
                Ok(response) => {
                    debug!(attempt, %target, status = %response.status(), "response received");
                    return Ok(response);
                }
                Err(err) if !final_attempt && is_transient_error(&err) => {
                    debug!(attempt, %target, error = %err, "transport error, retrying");
                }
                Err(err) => return Err(InfraError::from(err).into()),
            }

            tokio::time::sleep(self.backoff.saturating_mul(1 << (attempt - 1).min(8))).await;
            attempt += 1;
        }
    }

    /// [`Self::send`], mapping any non-2xx status to its domain error.
    pub async fn send_checked(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.send(builder).await?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(status_error(status, response.text().await.unwrap_or_default()))
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientBuilder {
    timeout: Duration,
    attempts: u32,
    backoff: Duration,
    use_proxy: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            attempts: 3,
            backoff: Duration::from_millis(200),
            use_proxy: true,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total tries per request, the first one included. Zero is read as one.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Ignore `HTTP(S)_PROXY` from the environment and connect directly.
    ///
    /// Only meant for talking to a mock server on loopback.
    pub fn no_proxy(mut self) -> Self {
        self.use_proxy = false;
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let mut builder = Client::builder().timeout(self.timeout).user_agent(USER_AGENT);
        if !self.use_proxy {
            builder = builder.no_proxy();
        }

        let inner = builder
            .build()
            .map_err(|err| AlmanacError::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(HttpClient { inner, attempts: self.attempts, backoff: self.backoff })
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn is_transient_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
