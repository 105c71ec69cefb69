//! Almanac daemon
//!
//! Loads configuration, opens the database, starts the reminder loop, the
//! calendar sync job and the OAuth callback server, then runs until Ctrl-C.

mod context;

use std::sync::Arc;

use anyhow::Context as _;
use almanac_infra::integrations::calendar::serve_callback;
use almanac_infra::observability::init_tracing;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::context::AppContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    let config = almanac_infra::config::load().context("failed to load configuration")?;
    init_tracing(&config.logging).context("failed to initialise logging")?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, "could not read .env"),
    }

    // Database failure here is the one fatal startup error.
    let ctx = AppContext::new(config).context("failed to initialise almanac")?;
    info!(
        remote = ctx.remote.is_some(),
        timezone = %ctx.calendar.timezone(),
        "almanac starting"
    );

    let mut reminder_scheduler = ctx.reminder_scheduler();
    if let Some(scheduler) = reminder_scheduler.as_mut() {
        scheduler.start().await.context("failed to start reminder scheduler")?;
    }

    let mut sync_scheduler = ctx.sync_scheduler();
    if let Some(scheduler) = sync_scheduler.as_mut() {
        scheduler.start().await.context("failed to start calendar sync scheduler")?;
    }

    let shutdown = CancellationToken::new();
    let server = spawn_callback_server(&ctx, shutdown.clone());

    tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
    info!("shutdown requested");

    if let Some(mut scheduler) = sync_scheduler {
        if let Err(err) = scheduler.stop().await {
            warn!(error = %err, "calendar sync scheduler did not stop cleanly");
        }
    }
    if let Some(mut scheduler) = reminder_scheduler {
        if let Err(err) = scheduler.stop().await {
            warn!(error = %err, "reminder scheduler did not stop cleanly");
        }
    }

    shutdown.cancel();
    if let Some(handle) = server {
        if let Err(err) = handle.await {
            warn!(error = %err, "callback server task panicked");
        }
    }

    info!("almanac stopped");
    Ok(())
}

fn spawn_callback_server(ctx: &AppContext, shutdown: CancellationToken) -> Option<JoinHandle<()>> {
    if !ctx.config.server.enabled {
        return None;
    }
    let remote = ctx.remote.as_ref()?;

    let oauth = Arc::clone(&remote.oauth);
    let bind_addr = ctx.config.server.bind_addr.clone();
    Some(tokio::spawn(async move {
        if let Err(err) = serve_callback(&bind_addr, oauth, shutdown).await {
            error!(error = %err, "OAuth callback server stopped");
        }
    }))
}
