//! Logging setup
//!
//! `RUST_LOG` takes precedence over the configured filter. Output is human
//! readable unless `logging.json` is set.

use almanac_domain::{AlmanacError, LoggingConfig, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// # Errors
/// `Config` when the filter directive is invalid or a subscriber is already
/// installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true).with_target(true))
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(true)).try_init()
    };

    installed.map_err(|err| AlmanacError::Config(format!("failed to install tracing subscriber: {err}")))
}

/// `RUST_LOG` if set and valid, otherwise the configured directive.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(&config.filter).map_err(|err| {
        AlmanacError::Config(format!("invalid log filter '{}': {err}", config.filter))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_directive_is_accepted() {
        let config = LoggingConfig { filter: "almanac_infra=debug,info".into(), json: false };
        assert!(build_filter(&config).is_ok());
    }
}
