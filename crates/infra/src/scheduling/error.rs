//! Scheduler error types

use std::time::Duration;

use almanac_domain::AlmanacError;
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::error::Elapsed;
use tokio_cron_scheduler::JobSchedulerError;

use crate::errors::InfraError;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler already running")]
    AlreadyRunning,

    #[error("Scheduler not running")]
    NotRunning,

    #[error("Failed to create scheduler: {source}")]
    CreationFailed {
        #[source]
        source: JobSchedulerError,
    },

    #[error("Failed to start scheduler: {source}")]
    StartFailed {
        #[source]
        source: JobSchedulerError,
    },

    #[error("Failed to stop scheduler: {source}")]
    StopFailed {
        #[source]
        source: JobSchedulerError,
    },

    /// The cron expression was rejected or the job could not be added.
    #[error("Failed to register job: {source}")]
    JobRegistrationFailed {
        #[source]
        source: JobSchedulerError,
    },

    #[error("Operation timed out after {duration:?}")]
    Timeout {
        duration: Duration,
        #[source]
        source: Elapsed,
    },

    #[error("Task join failed: {0}")]
    TaskJoinFailed(#[from] JoinError),

    /// The scheduled work itself failed.
    #[error(transparent)]
    Job(#[from] AlmanacError),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let almanac_err = match err {
            SchedulerError::Job(inner) => inner,
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                AlmanacError::InvalidInput(err.to_string())
            }
            SchedulerError::JobRegistrationFailed { .. } => AlmanacError::Config(err.to_string()),
            _ => AlmanacError::Internal(err.to_string()),
        };
        InfraError(almanac_err)
    }
}

impl From<SchedulerError> for AlmanacError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
