//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SYNC_CRON, DEFAULT_TIMEZONE, REMINDER_INTERVAL_SECS};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    /// Absent credentials disable remote mirroring and background sync.
    pub google: Option<GoogleConfig>,
    pub sync: SyncConfig,
    pub reminder: ReminderConfig,
    pub notifications: NotificationConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "almanac.db".to_string(), pool_size: 8, busy_timeout_ms: 5_000 }
    }
}

/// OAuth application credentials and provider endpoints.
#[derive(Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub redirect_uri: String,
    #[serde(default = "GoogleConfig::default_auth_url")]
    pub auth_url: String,
    #[serde(default = "GoogleConfig::default_token_url")]
    pub token_url: String,
    #[serde(default = "GoogleConfig::default_api_base_url")]
    pub api_base_url: String,
    /// Refresh this many seconds before the recorded expiry.
    #[serde(default)]
    pub refresh_skew_secs: i64,
}

impl GoogleConfig {
    pub fn default_auth_url() -> String {
        "https://accounts.google.com/o/oauth2/v2/auth".to_string()
    }

    pub fn default_token_url() -> String {
        "https://oauth2.googleapis.com/token".to_string()
    }

    pub fn default_api_base_url() -> String {
        "https://www.googleapis.com/calendar/v3".to_string()
    }
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .field("refresh_skew_secs", &self.refresh_skew_secs)
            .finish()
    }
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    /// Six-field cron expression (seconds first).
    pub cron: String,
    pub job_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { enabled: true, cron: DEFAULT_SYNC_CRON.to_string(), job_timeout_secs: 240 }
    }
}

/// Reminder scan configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub tick_timeout_secs: u64,
    /// IANA zone used to render event times and resolve naive user input.
    pub display_timezone: String,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: REMINDER_INTERVAL_SECS,
            tick_timeout_secs: 15,
            display_timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

/// Where reminder messages are delivered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Messages are only logged when unset.
    pub webhook_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// OAuth callback server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { enabled: true, bind_addr: "127.0.0.1:8080".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: "info".to_string(), json: false }
    }
}
