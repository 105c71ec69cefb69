//! OAuth credentials for the remote calendar provider

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Stored OAuth credential. One row per user; the latest write wins.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthCredential {
    pub user_id: UserId,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl OAuthCredential {
    /// True when the access token expires at or before `now + skew`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        self.expires_at <= now + skew
    }
}

// Tokens must never reach logs.
impl std::fmt::Debug for OAuthCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredential")
            .field("user_id", &self.user_id)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token endpoint response (authorization-code or refresh grant).
#[derive(Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "TokenGrant::default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenGrant {
    /// Longest access-token lifetime taken at face value.
    pub const MAX_LIFETIME_SECS: i64 = 2_147_483_647;

    fn default_token_type() -> String {
        "Bearer".to_string()
    }

    /// Turn a grant into a credential.
    ///
    /// When the provider omits the refresh token, `previous_refresh_token` is
    /// carried over. A missing `expires_in` is treated as already expired so
    /// the next use refreshes; an absurdly large one is capped at
    /// [`Self::MAX_LIFETIME_SECS`].
    pub fn into_credential(
        self,
        user_id: UserId,
        issued_at: DateTime<Utc>,
        previous_refresh_token: Option<String>,
    ) -> OAuthCredential {
        let lifetime = self.expires_in.unwrap_or(0).clamp(0, Self::MAX_LIFETIME_SECS);
        let expires_at = issued_at + Duration::seconds(lifetime);

        OAuthCredential {
            user_id,
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh_token),
            token_type: self.token_type,
            expires_at,
        }
    }
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
