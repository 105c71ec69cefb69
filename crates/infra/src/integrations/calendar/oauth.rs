//! OAuth2 authorization-code flow and token lifecycle for Google Calendar.
//!
//! Credentials live in the token repository, one row per user. Every remote
//! call goes through [`GoogleOAuthClient::authenticated_transport`], which
//! refreshes an expired access token before handing out a bearer handle.
//!
//! The `state` sent to the consent screen is a random token remembered by
//! the client. The callback can only redeem a token this process issued, once,
//! within [`STATE_TTL_MINUTES`].

use std::collections::HashMap;
use std::sync::Arc;

use almanac_core::TokenRepository;
use almanac_domain::{AlmanacError, GoogleConfig, OAuthCredential, Result, TokenGrant, UserId};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use reqwest::{Method, RequestBuilder, Response};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::http::HttpClient;

/// Read/write access to the user's calendars.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// How long an issued `state` stays redeemable.
pub const STATE_TTL_MINUTES: i64 = 10;

/// Bearer-token handle for one user's remote calls.
#[derive(Clone)]
pub struct AuthenticatedTransport {
    http: HttpClient,
    user_id: UserId,
    token_type: String,
    access_token: String,
}

impl AuthenticatedTransport {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Start a request carrying the `Authorization` header.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        if self.token_type.eq_ignore_ascii_case("bearer") {
            builder.bearer_auth(&self.access_token)
        } else {
            builder.header(
                reqwest::header::AUTHORIZATION,
                format!("{} {}", self.token_type, self.access_token),
            )
        }
    }

    /// Send with retries; non-success statuses are returned as responses.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        self.http.send(builder).await
    }

    /// Send with retries; non-success statuses become domain errors.
    pub async fn send_checked(&self, builder: RequestBuilder) -> Result<Response> {
        self.http.send_checked(builder).await
    }
}

impl std::fmt::Debug for AuthenticatedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedTransport")
            .field("user_id", &self.user_id)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

/// Consent round trip waiting for its callback.
#[derive(Debug, Clone, Copy)]
struct PendingAuthorization {
    user: UserId,
    issued_at: DateTime<Utc>,
}

/// Google OAuth client backed by the token repository.
pub struct GoogleOAuthClient {
    config: GoogleConfig,
    http: HttpClient,
    tokens: Arc<dyn TokenRepository>,
    pending: Mutex<HashMap<String, PendingAuthorization>>,
}

impl GoogleOAuthClient {
    pub fn new(config: GoogleConfig, tokens: Arc<dyn TokenRepository>) -> Result<Self> {
        Ok(Self::with_http_client(config, tokens, HttpClient::new()?))
    }

    pub fn with_http_client(
        config: GoogleConfig,
        tokens: Arc<dyn TokenRepository>,
        http: HttpClient,
    ) -> Self {
        Self { config, http, tokens, pending: Mutex::new(HashMap::new()) }
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Consent-screen URL for the given `state`.
    ///
    /// Requests offline access and forces the consent prompt so that a
    /// refresh token is issued even on re-authorization.
    pub fn authorization_url(&self, state: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", CALENDAR_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|err| AlmanacError::Config(format!("invalid OAuth authorization URL: {err}")))?;

        Ok(url.into())
    }

    /// Issue a single-use `state` bound to `user`.
    pub async fn issue_state(&self, user: UserId) -> String {
        self.issue_state_at(user, Utc::now()).await
    }

    pub async fn issue_state_at(&self, user: UserId, now: DateTime<Utc>) -> String {
        let state = random_state();
        let mut pending = self.pending.lock().await;
        pending.retain(|_, entry| !is_stale(entry, now));
        pending.insert(state.clone(), PendingAuthorization { user, issued_at: now });
        debug!(user = %user, pending = pending.len(), "OAuth state issued");
        state
    }

    /// Consume a `state` from [`Self::issue_state`] and return its user.
    ///
    /// # Errors
    /// `InvalidInput` when the state was never issued, was already redeemed,
    /// or is older than [`STATE_TTL_MINUTES`].
    pub async fn redeem_state(&self, state: &str) -> Result<UserId> {
        self.redeem_state_at(state, Utc::now()).await
    }

    pub async fn redeem_state_at(&self, state: &str, now: DateTime<Utc>) -> Result<UserId> {
        let entry = self.pending.lock().await.remove(state.trim());
        match entry {
            Some(entry) if !is_stale(&entry, now) => Ok(entry.user),
            Some(entry) => Err(AlmanacError::InvalidInput(format!(
                "OAuth state for user {} expired",
                entry.user
            ))),
            None => Err(AlmanacError::InvalidInput("unknown OAuth state".into())),
        }
    }

    /// Exchange an authorization code and persist the resulting credential.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, user: UserId, code: &str) -> Result<OAuthCredential> {
        let issued_at = Utc::now();
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let grant = self.token_request(&form, GrantKind::AuthorizationCode).await?;

        // A re-authorization may omit the refresh token; keep the stored one.
        let previous = self.tokens.get(user).await?.and_then(|c| c.refresh_token);
        let credential = grant.into_credential(user, issued_at, previous);

        if credential.refresh_token.is_none() {
            warn!(user = %user, "authorization completed without a refresh token");
        }

        self.tokens.upsert(&credential).await?;
        info!(user = %user, expires_at = %credential.expires_at, "calendar authorization stored");
        Ok(credential)
    }

    /// Bearer handle for `user`, refreshing the access token when needed.
    ///
    /// # Errors
    /// - `AuthRequired` when no credential is stored.
    /// - `AuthExpired` when no refresh token is stored or the provider
    ///   rejects it.
    /// - `RemoteUnavailable` when the token endpoint cannot be reached.
    pub async fn authenticated_transport(&self, user: UserId) -> Result<AuthenticatedTransport> {
        self.authenticated_transport_at(user, Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn authenticated_transport_at(
        &self,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedTransport> {
        let credential = self.tokens.get(user).await?.ok_or_else(|| {
            AlmanacError::AuthRequired(format!("user {user} has not authorized calendar access"))
        })?;

        let skew = Duration::seconds(self.config.refresh_skew_secs.max(0));
        let credential = if credential.is_expired_at(now, skew) {
            self.refresh(credential, now).await?
        } else {
            credential
        };

        Ok(AuthenticatedTransport {
            http: self.http.clone(),
            user_id: user,
            token_type: credential.token_type,
            access_token: credential.access_token,
        })
    }

    async fn refresh(
        &self,
        credential: OAuthCredential,
        now: DateTime<Utc>,
    ) -> Result<OAuthCredential> {
        let user = credential.user_id;
        let refresh_token = credential.refresh_token.ok_or_else(|| {
            AlmanacError::AuthExpired(format!("no refresh token stored for user {user}"))
        })?;

        debug!(user = %user, "access token expired, refreshing");

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let grant = self.token_request(&form, GrantKind::Refresh).await?;
        let refreshed = grant.into_credential(user, now, Some(refresh_token));

        self.tokens.upsert(&refreshed).await?;
        info!(user = %user, expires_at = %refreshed.expires_at, "access token refreshed");
        Ok(refreshed)
    }

    async fn token_request(&self, form: &[(&str, &str)], kind: GrantKind) -> Result<TokenGrant> {
        let url = Url::parse(&self.config.token_url)
            .map_err(|err| AlmanacError::Config(format!("invalid OAuth token URL: {err}")))?;

        let response = self.http.send(self.http.request(Method::POST, url).form(form)).await?;
        let status = response.status();

        if status.is_success() {
            return response.json::<TokenGrant>().await.map_err(|err| {
                AlmanacError::RemoteUnavailable(format!("undecodable token response: {err}"))
            });
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            warn!(%status, grant = kind.as_str(), "token endpoint rejected the grant");
            return Err(kind.rejected(format!("token endpoint returned {status}: {body}")));
        }

        Err(AlmanacError::RemoteUnavailable(format!("token endpoint returned {status}: {body}")))
    }
}

#[derive(Debug, Clone, Copy)]
enum GrantKind {
    AuthorizationCode,
    Refresh,
}

impl GrantKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::Refresh => "refresh_token",
        }
    }

    /// A rejected code is bad input; a rejected refresh token means the user
    /// must authorize again.
    fn rejected(self, message: String) -> AlmanacError {
        match self {
            Self::AuthorizationCode => AlmanacError::InvalidInput(message),
            Self::Refresh => AlmanacError::AuthExpired(message),
        }
    }
}

/// 32 random bytes, URL-safe base64.
fn random_state() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn is_stale(entry: &PendingAuthorization, now: DateTime<Utc>) -> bool {
    now - entry.issued_at > Duration::minutes(STATE_TTL_MINUTES)
}
