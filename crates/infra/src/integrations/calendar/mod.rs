//! Google Calendar integration
//!
//! OAuth2 authorization and token refresh, the v3 events client used for
//! mirroring and sync, and the HTTP callback that completes authorization.

pub mod callback;
pub mod google;
pub mod oauth;
pub mod types;

pub use callback::{callback_router, serve_callback};
pub use google::GoogleCalendarClient;
pub use oauth::{AuthenticatedTransport, GoogleOAuthClient, STATE_TTL_MINUTES};
pub use types::{GoogleEvent, GoogleEventBody, GoogleEventList, GoogleEventTime};
