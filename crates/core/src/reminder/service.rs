//! Reminder dispatch

use std::sync::Arc;

use almanac_domain::constants::REMINDER_WINDOW_MINUTES;
use almanac_domain::{Event, ReminderReport, Result};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, instrument, warn};

use super::ports::Notifier;
use crate::calendar::ports::EventRepository;

/// Notifies users about events starting soon.
///
/// Delivery is at-least-once: the reminder flag is only set after the
/// notifier succeeds, so a crash between the two repeats the message.
pub struct ReminderService {
    events: Arc<dyn EventRepository>,
    notifier: Arc<dyn Notifier>,
    timezone: Tz,
    window: Duration,
}

impl ReminderService {
    pub fn new(events: Arc<dyn EventRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            events,
            notifier,
            timezone: Tz::UTC,
            window: Duration::minutes(REMINDER_WINDOW_MINUTES),
        }
    }

    /// Timezone used to render start times
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Look-ahead window; must exceed the tick period so no event is missed
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub async fn tick(&self) -> Result<ReminderReport> {
        self.tick_at(Utc::now()).await
    }

    /// Send reminders for unsent events starting in `[now, now + window]`.
    #[instrument(skip(self))]
    pub async fn tick_at(&self, now: DateTime<Utc>) -> Result<ReminderReport> {
        let due = self.events.find_due_reminders(now, now + self.window).await?;
        let mut report = ReminderReport { due: due.len(), ..ReminderReport::default() };

        for event in &due {
            let message = format_reminder(event, self.timezone);

            if let Err(e) = self.notifier.notify(event.user_id, &message).await {
                warn!(user = %event.user_id, event_id = %event.id, error = %e, "reminder delivery failed");
                report.failed += 1;
                continue;
            }

            match self.events.mark_reminder_sent(event.user_id, &event.id, event.start).await {
                Ok(true) => report.sent += 1,
                Ok(false) => {
                    debug!(event_id = %event.id, "event moved or deleted while notifying; flag left clear");
                    report.sent += 1;
                }
                Err(e) => {
                    warn!(
                        user = %event.user_id,
                        event_id = %event.id,
                        error = %e,
                        "reminder sent but flag not recorded; it will be repeated"
                    );
                    report.failed += 1;
                }
            }
        }

        if report.due > 0 {
            info!(due = report.due, sent = report.sent, failed = report.failed, "reminder tick");
        }
        Ok(report)
    }
}

/// Render the reminder text for an event.
pub fn format_reminder(event: &Event, timezone: Tz) -> String {
    let start = event.start.with_timezone(&timezone);
    let mut message =
        format!("Reminder: {} starts at {}", event.title, start.format("%Y-%m-%d %H:%M %Z"));

    if let Some(description) = event.description.as_deref().filter(|d| !d.is_empty()) {
        message.push('\n');
        message.push_str(description);
    }
    message
}
