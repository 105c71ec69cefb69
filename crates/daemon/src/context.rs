//! Application context - dependency injection container

use std::sync::Arc;

use almanac_core::{CalendarService, ReminderService, RemoteMirror, SyncEngine};
use almanac_domain::{Config, Result};
use almanac_infra::config::display_timezone;
use almanac_infra::scheduling::{CalendarSyncSchedulerConfig, ReminderSchedulerConfig};
use almanac_infra::{
    notifier_from_config, CalendarSyncScheduler, DbManager, GoogleCalendarClient,
    GoogleOAuthClient, ReminderScheduler, SqliteEventRepository, SqliteSyncCursorRepository,
    SqliteTokenRepository,
};
use tracing::{info, warn};

/// Remote side of the context, present only when Google is configured.
pub struct RemoteContext {
    pub oauth: Arc<GoogleOAuthClient>,
    pub sync_engine: Arc<SyncEngine>,
}

/// Everything the daemon runs, wired once at startup.
pub struct AppContext {
    pub config: Config,
    pub calendar: Arc<CalendarService>,
    pub reminders: Arc<ReminderService>,
    pub remote: Option<RemoteContext>,
}

impl AppContext {
    /// Open the database and wire services.
    ///
    /// # Errors
    /// Fails when the database cannot be opened or migrated, or when the
    /// configuration names an unknown timezone.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::from_config(&config.database)?);
        db.run_migrations()?;
        db.health_check()?;
        info!(path = %db.path().display(), "database ready");

        let timezone = display_timezone(&config)?;
        let events = Arc::new(SqliteEventRepository::new(Arc::clone(&db)));
        let tokens = Arc::new(SqliteTokenRepository::new(Arc::clone(&db)));
        let cursors = Arc::new(SqliteSyncCursorRepository::new(Arc::clone(&db)));

        let (mirror, remote) = match config.google.clone() {
            Some(google) => {
                let oauth = Arc::new(GoogleOAuthClient::new(google, tokens.clone())?);
                let client = Arc::new(GoogleCalendarClient::new(Arc::clone(&oauth))?);
                let sync_engine = Arc::new(SyncEngine::new(
                    events.clone(),
                    client.clone(),
                    tokens.clone(),
                    cursors,
                ));
                (RemoteMirror::enabled(client, tokens), Some(RemoteContext { oauth, sync_engine }))
            }
            None => {
                warn!("Google credentials not configured; remote mirroring and sync disabled");
                (RemoteMirror::Disabled, None)
            }
        };

        let calendar =
            Arc::new(CalendarService::new(events.clone(), mirror).with_timezone(timezone));
        let notifier = notifier_from_config(&config.notifications)?;
        let reminders = Arc::new(ReminderService::new(events, notifier).with_timezone(timezone));

        Ok(Self { config, calendar, reminders, remote })
    }

    /// Reminder loop, when enabled.
    pub fn reminder_scheduler(&self) -> Option<ReminderScheduler> {
        self.config.reminder.enabled.then(|| {
            ReminderScheduler::new(
                Arc::clone(&self.reminders),
                ReminderSchedulerConfig::from(&self.config.reminder),
            )
        })
    }

    /// Sync cron job, when enabled and Google is configured.
    pub fn sync_scheduler(&self) -> Option<CalendarSyncScheduler> {
        let remote = self.remote.as_ref().filter(|_| self.config.sync.enabled)?;
        Some(CalendarSyncScheduler::new(
            CalendarSyncSchedulerConfig::from(&self.config.sync),
            Arc::clone(&remote.sync_engine),
        ))
    }
}
