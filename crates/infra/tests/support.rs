#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use almanac_core::TokenRepository;
use almanac_domain::{GoogleConfig, OAuthCredential, UserId};
use almanac_infra::database::{
    DbManager, SqliteEventRepository, SqliteSyncCursorRepository, SqliteTokenRepository,
};
use almanac_infra::http::HttpClient;
use almanac_infra::integrations::calendar::{GoogleCalendarClient, GoogleOAuthClient};
use chrono::{DateTime, Utc};
use tempfile::TempDir;
use wiremock::MockServer;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    pub events: Arc<SqliteEventRepository>,
    pub tokens: Arc<SqliteTokenRepository>,
    pub cursors: Arc<SqliteSyncCursorRepository>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager = Arc::new(
            DbManager::new(temp_dir.path().join("almanac-test.db"), 4)
                .expect("db manager should be created"),
        );
        manager.run_migrations().expect("schema migrations should apply");

        Self {
            events: Arc::new(SqliteEventRepository::new(Arc::clone(&manager))),
            tokens: Arc::new(SqliteTokenRepository::new(Arc::clone(&manager))),
            cursors: Arc::new(SqliteSyncCursorRepository::new(Arc::clone(&manager))),
            manager,
            _temp_dir: temp_dir,
        }
    }

    pub async fn store_credential(&self, credential: &OAuthCredential) {
        self.tokens.upsert(credential).await.expect("credential should persist");
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Google settings pointing every endpoint at the mock server.
pub fn google_config(server: &MockServer) -> GoogleConfig {
    GoogleConfig {
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
        redirect_uri: "http://localhost:8080/oauth/callback".into(),
        auth_url: format!("{}/o/oauth2/v2/auth", server.uri()),
        token_url: format!("{}/token", server.uri()),
        api_base_url: server.uri(),
        refresh_skew_secs: 0,
    }
}

/// Direct-to-loopback HTTP client with short backoff so retry paths stay fast.
pub fn fast_http() -> HttpClient {
    HttpClient::builder()
        .base_backoff(Duration::from_millis(5))
        .timeout(Duration::from_secs(5))
        .no_proxy()
        .build()
        .expect("http client")
}

pub fn oauth_client(server: &MockServer, db: &TestDatabase) -> Arc<GoogleOAuthClient> {
    Arc::new(GoogleOAuthClient::with_http_client(
        google_config(server),
        db.tokens.clone(),
        fast_http(),
    ))
}

pub fn calendar_client(server: &MockServer, db: &TestDatabase) -> Arc<GoogleCalendarClient> {
    Arc::new(GoogleCalendarClient::new(oauth_client(server, db)).expect("calendar client"))
}

pub fn credential(
    user: UserId,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_at: DateTime<Utc>,
) -> OAuthCredential {
    OAuthCredential {
        user_id: user,
        access_token: access_token.into(),
        refresh_token: refresh_token.map(Into::into),
        token_type: "Bearer".into(),
        expires_at,
    }
}

/// A credential valid for the next hour.
pub fn fresh_credential(user: UserId) -> OAuthCredential {
    credential(user, "access-token", Some("refresh-token"), Utc::now() + chrono::Duration::hours(1))
}
