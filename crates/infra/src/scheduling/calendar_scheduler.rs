//! Cron-driven calendar sync sweep.
//!
//! Each firing runs [`SyncEngine::sync_all`] under a job timeout. Failures
//! are logged and the next firing runs as usual.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use almanac_core::SyncEngine;
//! use almanac_infra::scheduling::{CalendarSyncScheduler, CalendarSyncSchedulerConfig, SchedulerResult};
//!
//! # async fn example(engine: Arc<SyncEngine>) -> SchedulerResult<()> {
//! let mut scheduler = CalendarSyncScheduler::new(
//!     CalendarSyncSchedulerConfig { cron_expression: "0 */5 * * * *".into(), ..Default::default() },
//!     engine,
//! );
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use almanac_core::SyncEngine;
use almanac_domain::constants::DEFAULT_SYNC_CRON;
use almanac_domain::{SweepReport, SyncConfig};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the calendar sync scheduler.
#[derive(Debug, Clone)]
pub struct CalendarSyncSchedulerConfig {
    /// Six-field cron expression (seconds first).
    pub cron_expression: String,
    /// Timeout applied to a single sweep.
    pub job_timeout: Duration,
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
}

impl Default for CalendarSyncSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: DEFAULT_SYNC_CRON.into(),
            job_timeout: Duration::from_secs(240),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&SyncConfig> for CalendarSyncSchedulerConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            cron_expression: config.cron.clone(),
            job_timeout: Duration::from_secs(config.job_timeout_secs.max(1)),
            ..Self::default()
        }
    }
}

/// Calendar sync scheduler with explicit lifecycle management.
pub struct CalendarSyncScheduler {
    scheduler: Option<JobScheduler>,
    config: CalendarSyncSchedulerConfig,
    engine: Arc<SyncEngine>,
}

impl CalendarSyncScheduler {
    pub fn new(config: CalendarSyncSchedulerConfig, engine: Arc<SyncEngine>) -> Self {
        Self { scheduler: None, config, engine }
    }

    /// Register the cron job and start firing.
    #[instrument(skip(self), fields(cron = %self.config.cron_expression))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?
            .map_err(|source| SchedulerError::StartFailed { source })?;

        self.scheduler = Some(scheduler_instance);
        info!("Calendar sync scheduler started");
        Ok(())
    }

    /// Shut the cron scheduler down. An in-flight sweep is abandoned.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(mut scheduler) = self.scheduler.take() else {
            return Err(SchedulerError::NotRunning);
        };

        let stop_timeout = self.config.stop_timeout;
        tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
            .await
            .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?
            .map_err(|source| SchedulerError::StopFailed { source })?;

        info!("Calendar sync scheduler stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Run one sweep now, under the job timeout.
    pub async fn run_once(&self) -> SchedulerResult<SweepReport> {
        Self::run_sweep(&self.engine, self.config.job_timeout).await
    }

    async fn run_sweep(engine: &SyncEngine, job_timeout: Duration) -> SchedulerResult<SweepReport> {
        let report = tokio::time::timeout(job_timeout, engine.sync_all())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: job_timeout, source })??;
        Ok(report)
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler =
            JobScheduler::new().await.map_err(|source| SchedulerError::CreationFailed { source })?;
        let engine = Arc::clone(&self.engine);
        let job_timeout = self.config.job_timeout;

        let job_definition =
            Job::new_async(self.config.cron_expression.as_str(), move |_id, _lock| {
                let engine = Arc::clone(&engine);

                Box::pin(async move {
                    let started = Instant::now();
                    match Self::run_sweep(&engine, job_timeout).await {
                        Ok(report) => {
                            debug!(
                                users = report.users,
                                failed = report.failed,
                                elapsed_ms = started.elapsed().as_millis() as u64,
                                "calendar sync job finished"
                            );
                        }
                        Err(SchedulerError::Timeout { duration, .. }) => {
                            warn!(timeout_secs = duration.as_secs(), "calendar sync job timed out");
                        }
                        Err(err) => {
                            error!(error = %err, "calendar sync job failed");
                        }
                    }
                })
            })
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        let job_id = job_definition.guid();
        scheduler
            .add(job_definition)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "registered calendar sync job");
        Ok(scheduler)
    }
}

impl Drop for CalendarSyncScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("CalendarSyncScheduler dropped while running; jobs stop with the runtime");
        }
    }
}
