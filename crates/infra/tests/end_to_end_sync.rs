//! Local writes mirrored to a mock Google Calendar, then pulled back.

mod support;

use almanac_core::{CalendarService, EventRepository, RemoteMirror, SyncCursorRepository, SyncEngine};
use almanac_domain::{EventDraft, UserId};
use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde_json::{json, Value};
use support::{calendar_client, fresh_credential, TestDatabase};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVENTS_PATH: &str = "/calendars/primary/events";
const USER: UserId = UserId(1);

struct Harness {
    server: MockServer,
    db: TestDatabase,
    service: CalendarService,
    engine: SyncEngine,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    db.store_credential(&fresh_credential(USER)).await;

    let remote = calendar_client(&server, &db);
    let service = CalendarService::new(
        db.events.clone(),
        RemoteMirror::enabled(remote.clone(), db.tokens.clone()),
    );
    let engine =
        SyncEngine::new(db.events.clone(), remote, db.tokens.clone(), db.cursors.clone());

    Harness { server, db, service, engine }
}

fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn remote_item(id: &str, title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Value {
    json!({
        "id": id,
        "status": "confirmed",
        "summary": title,
        "start": {"dateTime": ts(start), "timeZone": "UTC"},
        "end": {"dateTime": ts(end), "timeZone": "UTC"},
    })
}

async fn mount_listing(server: &MockServer, first_sync: bool, items: Vec<Value>) {
    let mock = Mock::given(method("GET")).and(path(EVENTS_PATH));
    let mock = if first_sync {
        mock.and(query_param_is_missing("updatedMin"))
    } else {
        mock.and(query_param("showDeleted", "true")).and(query_param_is_missing("timeMin"))
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn mirrored_event_is_not_duplicated_by_sync() {
    let h = harness().await;
    let now = Utc::now();
    let start = now + Duration::days(1);
    let end = start + Duration::hours(1);

    Mock::given(method("POST"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "g-1"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let created = h.service.create_event(USER, EventDraft::new("Review", ts(start), ts(end))).await.unwrap();
    assert_eq!(created.remote_event_id.as_deref(), Some("g-1"));

    // The provider echoes our own event plus one created elsewhere.
    let other_start = start + Duration::hours(3);
    mount_listing(
        &h.server,
        true,
        vec![
            remote_item("g-1", "Review", start, end),
            remote_item("g-2", "Lunch", other_start, other_start + Duration::hours(1)),
        ],
    )
    .await;

    let report = h.engine.sync_user_at(USER, now).await.unwrap();
    assert!(report.first_sync);
    assert_eq!((report.created, report.unchanged, report.skipped), (1, 1, 0));

    let local = h.db.events.list_by_range(USER, now, now + Duration::days(2)).await.unwrap();
    assert_eq!(local.len(), 2);
    assert_eq!(local[0].id, created.id);
    assert_eq!(local[1].remote_event_id.as_deref(), Some("g-2"));
    assert_eq!(local[1].title, "Lunch");
}

#[tokio::test]
async fn incremental_sync_applies_edits_and_cancellations() {
    let h = harness().await;
    let now = Utc::now();
    let start = now + Duration::days(2);

    mount_listing(
        &h.server,
        true,
        vec![
            remote_item("g-1", "Planning", start, start + Duration::hours(1)),
            remote_item("g-2", "Retro", start + Duration::hours(2), start + Duration::hours(3)),
        ],
    )
    .await;
    let first = h.engine.sync_user_at(USER, now).await.unwrap();
    assert_eq!(first.created, 2);

    h.server.reset().await;
    let moved = start + Duration::hours(5);
    mount_listing(
        &h.server,
        false,
        vec![
            remote_item("g-1", "Planning (moved)", moved, moved + Duration::hours(1)),
            json!({"id": "g-2", "status": "cancelled"}),
            json!({"id": "g-unknown", "status": "cancelled"}),
        ],
    )
    .await;

    let later = now + Duration::minutes(5);
    let second = h.engine.sync_user_at(USER, later).await.unwrap();
    assert!(!second.first_sync);
    assert_eq!((second.updated, second.deleted, second.unchanged), (1, 1, 1));

    let edited = h.db.events.find_by_remote_id(USER, "g-1").await.unwrap().unwrap();
    assert_eq!(edited.title, "Planning (moved)");
    assert_eq!(edited.start, moved.trunc_subsecs(0));
    assert!(h.db.events.find_by_remote_id(USER, "g-2").await.unwrap().is_none());

    // Replaying the same snapshot changes nothing.
    let replay = h.engine.sync_user_at(USER, later + Duration::minutes(5)).await.unwrap();
    assert_eq!(replay.changed(), 0);
    assert_eq!(replay.unchanged, 3);
}

#[tokio::test]
async fn malformed_item_is_skipped_and_cursor_still_advances() {
    let h = harness().await;
    let now = Utc::now();
    let start = now + Duration::hours(4);

    mount_listing(
        &h.server,
        true,
        vec![
            json!({"id": "broken", "summary": "No times"}),
            remote_item("g-ok", "Fine", start, start + Duration::minutes(30)),
        ],
    )
    .await;

    let report = h.engine.sync_user_at(USER, now).await.unwrap();
    assert_eq!((report.created, report.skipped), (1, 1));
    assert!(report.cursor.is_some());
}

#[tokio::test]
async fn provider_outage_keeps_local_write_and_cursor() {
    let h = harness().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&h.server)
        .await;

    let start = Utc::now() + Duration::days(1);
    let created = h
        .service
        .create_event(USER, EventDraft::new("Offline", ts(start), ts(start + Duration::hours(1))))
        .await
        .unwrap();
    assert!(created.remote_event_id.is_none());
    assert!(h.db.events.get(USER, &created.id).await.unwrap().is_some());

    assert!(h.engine.sync_user(USER).await.is_err());
    assert!(h.db.cursors.get(USER).await.unwrap().is_none());
}

#[tokio::test]
async fn local_delete_removes_the_mirrored_copy() {
    let h = harness().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "g-9"})))
        .mount(&h.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{EVENTS_PATH}/g-9")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;

    let start = Utc::now() + Duration::days(1);
    let created = h
        .service
        .create_event(USER, EventDraft::new("Gym", ts(start), ts(start + Duration::hours(1))))
        .await
        .unwrap();

    h.service.delete_event(USER, &created.id).await.unwrap();
    assert!(h.db.events.get(USER, &created.id).await.unwrap().is_none());
}
