//! HTTP endpoints for the OAuth consent round trip.
//!
//! `GET /oauth/authorize?user_id=N` redirects to the provider's consent
//! screen; the provider sends the browser back to
//! `GET /oauth/callback?code&state`, where the code is exchanged and stored.
//! Only a `state` issued by the authorize route is accepted.

use std::sync::Arc;

use almanac_domain::{AlmanacError, Result, UserId};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::oauth::GoogleOAuthClient;

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Authorization Complete</title></head>
<body><h1>Calendar connected</h1><p>You can close this window.</p></body>
</html>"#;

#[derive(Debug, Deserialize)]
struct AuthorizeParams {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Router serving the authorize redirect and the OAuth callback.
pub fn callback_router(oauth: Arc<GoogleOAuthClient>) -> Router {
    Router::new()
        .route("/oauth/authorize", get(handle_authorize))
        .route("/oauth/callback", get(handle_callback))
        .with_state(oauth)
}

/// Serve the router on `bind_addr` until `shutdown` is cancelled.
pub async fn serve_callback(
    bind_addr: &str,
    oauth: Arc<GoogleOAuthClient>,
    shutdown: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind(bind_addr).await.map_err(|err| {
        AlmanacError::Config(format!("failed to bind OAuth callback server on {bind_addr}: {err}"))
    })?;
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "OAuth callback server listening");
    }

    axum::serve(listener, callback_router(oauth))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|err| AlmanacError::Internal(format!("OAuth callback server error: {err}")))
}

async fn handle_authorize(
    State(oauth): State<Arc<GoogleOAuthClient>>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    let user = match params.user_id.as_deref().map(str::parse::<UserId>) {
        Some(Ok(user)) => user,
        _ => return failure(StatusCode::BAD_REQUEST, "A numeric user_id is required."),
    };

    let state = oauth.issue_state(user).await;
    match oauth.authorization_url(&state) {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(err) => {
            error!(error = %err, "could not build authorization URL");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Authorization is misconfigured.")
        }
    }
}

async fn handle_callback(
    State(oauth): State<Arc<GoogleOAuthClient>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(reason) = params.error {
        warn!(%reason, "provider returned an authorization error");
        return failure(StatusCode::BAD_REQUEST, "Authorization was not granted.");
    }

    let (Some(code), Some(state)) = (params.code, params.state) else {
        return failure(StatusCode::BAD_REQUEST, "Missing code or state parameter.");
    };

    let user = match oauth.redeem_state(&state).await {
        Ok(user) => user,
        Err(err) => {
            warn!(error = %err, "rejected OAuth callback state");
            return failure(StatusCode::BAD_REQUEST, "Invalid state parameter.");
        }
    };

    match oauth.exchange_code(user, &code).await {
        Ok(_) => {
            info!(user = %user, "OAuth callback completed");
            Html(SUCCESS_PAGE).into_response()
        }
        Err(AlmanacError::InvalidInput(msg)) => {
            warn!(user = %user, %msg, "authorization code rejected");
            failure(StatusCode::BAD_REQUEST, "The authorization code was rejected.")
        }
        Err(err) => {
            error!(user = %user, error = %err, "authorization code exchange failed");
            failure(StatusCode::BAD_GATEWAY, "Could not reach the calendar provider.")
        }
    }
}

fn failure(status: StatusCode, detail: &str) -> Response {
    let page = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Authorization Failed</title></head>\n\
         <body><h1>Authorization Failed</h1><p>{detail}</p></body>\n</html>"
    );
    (status, Html(page)).into_response()
}
