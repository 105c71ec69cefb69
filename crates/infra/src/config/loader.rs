//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Probe for a config file (JSON or TOML); use defaults when none exists
//! 2. Apply `ALMANAC_*` environment variables on top; the environment wins
//! 3. Validate the result
//!
//! ## Environment Variables
//! - `ALMANAC_DB_PATH`, `ALMANAC_DB_POOL_SIZE`
//! - `ALMANAC_GOOGLE_CLIENT_ID`, `ALMANAC_GOOGLE_CLIENT_SECRET`,
//!   `ALMANAC_GOOGLE_REDIRECT_URI`, `ALMANAC_GOOGLE_API_BASE_URL`
//! - `ALMANAC_SYNC_ENABLED`, `ALMANAC_SYNC_CRON`
//! - `ALMANAC_REMINDER_ENABLED`, `ALMANAC_REMINDER_INTERVAL`,
//!   `ALMANAC_DISPLAY_TIMEZONE`
//! - `ALMANAC_WEBHOOK_URL`
//! - `ALMANAC_SERVER_ENABLED`, `ALMANAC_BIND_ADDR`
//! - `ALMANAC_LOG_FILTER`, `ALMANAC_LOG_JSON`
//!
//! ## File Locations
//! `almanac.{toml,json}` then `config.{toml,json}`, first in the working
//! directory and then next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use almanac_domain::{AlmanacError, Config, GoogleConfig, Result};
use chrono_tz::Tz;

const CONFIG_FILE_NAMES: [&str; 4] = ["almanac.toml", "almanac.json", "config.toml", "config.json"];

/// Load configuration from the probed file (if any) and the environment.
///
/// # Errors
/// Returns `AlmanacError::Config` if a file is unreadable or malformed, an
/// environment value does not parse, or the merged result is invalid.
pub fn load() -> Result<Config> {
    let base = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, starting from defaults");
            Config::default()
        }
    };

    let config = apply_env(base)?;
    validate(&config)?;
    Ok(config)
}

/// Defaults overlaid with environment variables only.
pub fn load_from_env() -> Result<Config> {
    let config = apply_env(Config::default())?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `AlmanacError::Config` if the file is missing, unreadable or not
/// valid for its extension.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AlmanacError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AlmanacError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| AlmanacError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AlmanacError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AlmanacError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(AlmanacError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Overlay `ALMANAC_*` environment variables on `config`.
pub fn apply_env(mut config: Config) -> Result<Config> {
    if let Some(path) = env_opt("ALMANAC_DB_PATH") {
        config.database.path = path;
    }
    if let Some(size) = env_parse::<u32>("ALMANAC_DB_POOL_SIZE")? {
        config.database.pool_size = size;
    }

    let client_id = env_opt("ALMANAC_GOOGLE_CLIENT_ID");
    let client_secret = env_opt("ALMANAC_GOOGLE_CLIENT_SECRET");
    let redirect_uri = env_opt("ALMANAC_GOOGLE_REDIRECT_URI");
    let api_base_url = env_opt("ALMANAC_GOOGLE_API_BASE_URL");
    if client_id.is_some() || client_secret.is_some() || redirect_uri.is_some() {
        let mut google = config.google.take().unwrap_or_else(|| GoogleConfig {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            auth_url: GoogleConfig::default_auth_url(),
            token_url: GoogleConfig::default_token_url(),
            api_base_url: GoogleConfig::default_api_base_url(),
            refresh_skew_secs: 0,
        });
        if let Some(v) = client_id {
            google.client_id = v;
        }
        if let Some(v) = client_secret {
            google.client_secret = v;
        }
        if let Some(v) = redirect_uri {
            google.redirect_uri = v;
        }
        config.google = Some(google);
    }
    if let (Some(url), Some(google)) = (api_base_url, config.google.as_mut()) {
        google.api_base_url = url;
    }

    if let Some(enabled) = env_bool("ALMANAC_SYNC_ENABLED") {
        config.sync.enabled = enabled;
    }
    if let Some(cron) = env_opt("ALMANAC_SYNC_CRON") {
        config.sync.cron = cron;
    }

    if let Some(enabled) = env_bool("ALMANAC_REMINDER_ENABLED") {
        config.reminder.enabled = enabled;
    }
    if let Some(secs) = env_parse::<u64>("ALMANAC_REMINDER_INTERVAL")? {
        config.reminder.interval_seconds = secs;
    }
    if let Some(tz) = env_opt("ALMANAC_DISPLAY_TIMEZONE") {
        config.reminder.display_timezone = tz;
    }

    if let Some(url) = env_opt("ALMANAC_WEBHOOK_URL") {
        config.notifications.webhook_url = Some(url);
    }

    if let Some(enabled) = env_bool("ALMANAC_SERVER_ENABLED") {
        config.server.enabled = enabled;
    }
    if let Some(addr) = env_opt("ALMANAC_BIND_ADDR") {
        config.server.bind_addr = addr;
    }

    if let Some(filter) = env_opt("ALMANAC_LOG_FILTER") {
        config.logging.filter = filter;
    }
    if let Some(json) = env_bool("ALMANAC_LOG_JSON") {
        config.logging.json = json;
    }

    Ok(config)
}

/// Reject configurations the daemon cannot run with.
pub fn validate(config: &Config) -> Result<()> {
    if config.database.path.trim().is_empty() {
        return Err(AlmanacError::Config("database.path must not be empty".into()));
    }
    if config.database.pool_size == 0 {
        return Err(AlmanacError::Config("database.pool_size must be at least 1".into()));
    }
    if config.reminder.interval_seconds == 0 {
        return Err(AlmanacError::Config("reminder.interval_seconds must be at least 1".into()));
    }
    display_timezone(config)?;

    if let Some(google) = &config.google {
        for (name, value) in [
            ("client_id", &google.client_id),
            ("client_secret", &google.client_secret),
            ("redirect_uri", &google.redirect_uri),
        ] {
            if value.trim().is_empty() {
                return Err(AlmanacError::Config(format!("google.{name} must not be empty")));
            }
        }
    }

    Ok(())
}

/// Parsed display timezone.
pub fn display_timezone(config: &Config) -> Result<Tz> {
    Tz::from_str(config.reminder.display_timezone.trim()).map_err(|_| {
        AlmanacError::Config(format!(
            "unknown display timezone: {}",
            config.reminder.display_timezone
        ))
    })
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| AlmanacError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
fn env_bool(key: &str) -> Option<bool> {
    env_opt(key).map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
