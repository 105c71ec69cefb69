//! Interval loop that drives the reminder dispatcher.
//!
//! The loop sleeps for the configured interval, runs one
//! [`ReminderService::tick`] under a timeout and repeats until stopped. A
//! failed or timed-out tick is logged; the next tick retries whatever was not
//! delivered.

use std::sync::Arc;
use std::time::{Duration, Instant};

use almanac_core::ReminderService;
use almanac_domain::constants::REMINDER_INTERVAL_SECS;
use almanac_domain::{ReminderConfig, ReminderReport};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the reminder scheduler
#[derive(Debug, Clone)]
pub struct ReminderSchedulerConfig {
    /// Pause between ticks
    pub interval: Duration,
    /// Upper bound for a single tick
    pub tick_timeout: Duration,
    /// How long `stop` waits for the loop to exit
    pub join_timeout: Duration,
}

impl Default for ReminderSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(REMINDER_INTERVAL_SECS),
            tick_timeout: Duration::from_secs(15),
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&ReminderConfig> for ReminderSchedulerConfig {
    fn from(config: &ReminderConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_seconds.max(1)),
            tick_timeout: Duration::from_secs(config.tick_timeout_secs.max(1)),
            ..Self::default()
        }
    }
}

/// Reminder scheduler with explicit start/stop.
pub struct ReminderScheduler {
    service: Arc<ReminderService>,
    config: ReminderSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl ReminderScheduler {
    pub fn new(service: Arc<ReminderService>, config: ReminderSchedulerConfig) -> Self {
        Self {
            service,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn the background loop.
    ///
    /// # Errors
    ///
    /// Returns error if the scheduler is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        // Fresh token so the scheduler can be restarted after stop
        self.cancellation_token = CancellationToken::new();

        let service = Arc::clone(&self.service);
        let config = self.config.clone();
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::reminder_loop(service, config, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        info!(interval_secs = self.config.interval.as_secs(), "Reminder scheduler started");
        Ok(())
    }

    /// Cancel the loop and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns error if the scheduler is not running
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("Reminder scheduler stopped");
        Ok(())
    }

    /// True while the background loop is alive.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Run a single tick now, under the tick timeout.
    pub async fn run_once(&self) -> SchedulerResult<ReminderReport> {
        Self::run_tick(&self.service, self.config.tick_timeout).await
    }

    async fn run_tick(
        service: &ReminderService,
        tick_timeout: Duration,
    ) -> SchedulerResult<ReminderReport> {
        let report = tokio::time::timeout(tick_timeout, service.tick())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: tick_timeout, source })??;
        Ok(report)
    }

    async fn reminder_loop(
        service: Arc<ReminderService>,
        config: ReminderSchedulerConfig,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Reminder loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(config.interval) => {
                    let started = Instant::now();
                    match Self::run_tick(&service, config.tick_timeout).await {
                        Ok(report) if report.due > 0 => {
                            debug!(
                                due = report.due,
                                sent = report.sent,
                                failed = report.failed,
                                elapsed_ms = started.elapsed().as_millis() as u64,
                                "reminder tick finished"
                            );
                        }
                        Ok(_) => {}
                        Err(SchedulerError::Timeout { duration, .. }) => {
                            warn!(timeout_secs = duration.as_secs(), "reminder tick timed out");
                        }
                        Err(err) => {
                            error!(error = %err, "reminder tick failed");
                        }
                    }
                }
            }
        }
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() && self.is_running() {
            warn!("ReminderScheduler dropped while running; cancelling");
            self.cancellation_token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use almanac_core::{EventRepository, Notifier};
    use almanac_domain::{Event, EventFields, Result, UserId};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use tempfile::TempDir;

    use super::*;
    use crate::database::{DbManager, SqliteEventRepository};

    #[derive(Default)]
    struct CollectingNotifier {
        sent: StdMutex<Vec<(UserId, String)>>,
    }

    #[async_trait]
    impl Notifier for CollectingNotifier {
        async fn notify(&self, user: UserId, message: &str) -> Result<()> {
            self.sent.lock().unwrap().push((user, message.to_string()));
            Ok(())
        }
    }

    struct Fixture {
        _dir: TempDir,
        events: Arc<SqliteEventRepository>,
        notifier: Arc<CollectingNotifier>,
        service: Arc<ReminderService>,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(DbManager::new(dir.path().join("reminders.db"), 2).unwrap());
        db.run_migrations().unwrap();

        let events = Arc::new(SqliteEventRepository::new(db));
        let notifier = Arc::new(CollectingNotifier::default());
        let service = Arc::new(ReminderService::new(events.clone(), notifier.clone()));
        Fixture { _dir: dir, events, notifier, service }
    }

    async fn seed_event(events: &SqliteEventRepository, starts_in: ChronoDuration) -> Event {
        let now = Utc::now();
        let start = now + starts_in;
        let fields = EventFields::new("Standup", None, start, start + ChronoDuration::minutes(15))
            .unwrap();
        let event = Event::new(UserId(42), fields, now);
        events.insert(&event).await.unwrap();
        event
    }

    fn fast_config() -> ReminderSchedulerConfig {
        ReminderSchedulerConfig {
            interval: Duration::from_millis(50),
            tick_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn run_once_delivers_and_flags() {
        let fx = fixture();
        let event = seed_event(&fx.events, ChronoDuration::minutes(10)).await;

        let scheduler = ReminderScheduler::new(fx.service.clone(), fast_config());
        let report = scheduler.run_once().await.unwrap();

        assert_eq!((report.due, report.sent, report.failed), (1, 1, 0));
        let stored = fx.events.get(UserId(42), &event.id).await.unwrap().unwrap();
        assert!(stored.reminder_sent);

        let again = scheduler.run_once().await.unwrap();
        assert_eq!(again.due, 0);
        assert_eq!(fx.notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn background_loop_ticks_until_stopped() {
        let fx = fixture();
        seed_event(&fx.events, ChronoDuration::minutes(30)).await;

        let mut scheduler = ReminderScheduler::new(fx.service.clone(), fast_config());
        scheduler.start().await.unwrap();
        assert!(scheduler.is_running());
        assert!(matches!(scheduler.start().await, Err(SchedulerError::AlreadyRunning)));

        let deadline = Instant::now() + Duration::from_secs(5);
        while fx.notifier.sent.lock().unwrap().is_empty() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_running());

        let sent = fx.notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, UserId(42));
        assert!(sent[0].1.contains("Standup"));
    }

    #[tokio::test]
    async fn stop_without_start_is_rejected() {
        let fx = fixture();
        let mut scheduler = ReminderScheduler::new(fx.service.clone(), fast_config());
        assert!(matches!(scheduler.stop().await, Err(SchedulerError::NotRunning)));
    }
}
