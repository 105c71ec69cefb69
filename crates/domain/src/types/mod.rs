//! Domain types and models

pub mod credential;
pub mod event;
pub mod remote;
pub mod sync;
pub mod user;

pub use credential::{OAuthCredential, TokenGrant};
pub use event::{Event, EventDraft, EventFields};
pub use remote::{RemoteEvent, RemoteEventStatus, RemoteQuery, RemoteTime};
pub use sync::{ReminderReport, SweepReport, SyncCursor, SyncReport};
pub use user::UserId;
