//! Integration tests for reminder dispatch.

mod support;

use std::sync::Arc;

use almanac_core::ReminderService;
use almanac_domain::{Event, EventFields, UserId};
use chrono::{DateTime, Duration, Utc};
use support::{t0, InMemoryEventRepository, RecordingNotifier};

fn event_at(user: i64, title: &str, start: DateTime<Utc>) -> Event {
    let fields = EventFields::new(title, None, start, start + Duration::minutes(30)).unwrap();
    Event::new(UserId(user), fields, start - Duration::days(1))
}

fn service(events: &InMemoryEventRepository, notifier: &RecordingNotifier) -> ReminderService {
    ReminderService::new(Arc::new(events.clone()), Arc::new(notifier.clone()))
}

#[tokio::test]
async fn due_event_is_notified_and_flagged() {
    let now = t0();
    let event = event_at(1, "Planning", now + Duration::minutes(30));
    let events = InMemoryEventRepository::new().with_event(event.clone());
    let notifier = RecordingNotifier::new();

    let report = service(&events, &notifier).tick_at(now).await.unwrap();

    assert_eq!((report.due, report.sent, report.failed), (1, 1, 0));
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, UserId(1));
    assert!(sent[0].1.contains("Planning"));
    assert!(events.all()[0].reminder_sent);

    // Already flagged: nothing more to send.
    let report = service(&events, &notifier).tick_at(now + Duration::seconds(20)).await.unwrap();
    assert_eq!(report.due, 0);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn failed_delivery_keeps_flag_for_retry() {
    let now = t0();
    let events =
        InMemoryEventRepository::new().with_event(event_at(2, "Call", now + Duration::minutes(30)));
    let notifier = RecordingNotifier::new();
    notifier.fail_for(UserId(2));
    let reminders = service(&events, &notifier);

    let report = reminders.tick_at(now).await.unwrap();
    assert_eq!((report.due, report.sent, report.failed), (1, 0, 1));
    assert!(!events.all()[0].reminder_sent);

    let report = reminders.tick_at(now + Duration::seconds(20)).await.unwrap();
    assert_eq!(report.failed, 1);
    assert!(!events.all()[0].reminder_sent);

    notifier.recover(UserId(2));
    let report = reminders.tick_at(now + Duration::seconds(40)).await.unwrap();
    assert_eq!(report.sent, 1);
    assert!(events.all()[0].reminder_sent);
}

#[tokio::test]
async fn events_outside_window_are_ignored() {
    let now = t0();
    let events = InMemoryEventRepository::new()
        .with_event(event_at(1, "Too far", now + Duration::minutes(90)))
        .with_event(event_at(1, "Already started", now - Duration::minutes(1)))
        .with_event(event_at(1, "Edge", now + Duration::hours(1)));
    let notifier = RecordingNotifier::new();

    let report = service(&events, &notifier).tick_at(now).await.unwrap();

    assert_eq!(report.due, 1);
    assert!(notifier.sent()[0].1.contains("Edge"));
}

#[tokio::test]
async fn one_failure_does_not_block_other_users() {
    let now = t0();
    let events = InMemoryEventRepository::new()
        .with_event(event_at(1, "A", now + Duration::minutes(10)))
        .with_event(event_at(2, "B", now + Duration::minutes(20)));
    let notifier = RecordingNotifier::new();
    notifier.fail_for(UserId(1));

    let report = service(&events, &notifier).tick_at(now).await.unwrap();

    assert_eq!((report.due, report.sent, report.failed), (2, 1, 1));
    assert_eq!(notifier.sent()[0].0, UserId(2));
}

#[tokio::test]
async fn custom_window_narrows_the_scan() {
    let now = t0();
    let events =
        InMemoryEventRepository::new().with_event(event_at(1, "Soon", now + Duration::minutes(30)));
    let notifier = RecordingNotifier::new();

    let report = service(&events, &notifier)
        .with_window(Duration::minutes(15))
        .tick_at(now)
        .await
        .unwrap();

    assert_eq!(report.due, 0);
}
