use calendar_core::db::open_db_in_memory;
use calendar_core::{Event, EventStore, MemoryEventStore, SqliteEventStore, StoreError};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeSet;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

fn event(user_id: &str, title: &str, start: DateTime<Utc>) -> Event {
    let mut event = Event::new(user_id, title, start);
    event.description = format!("{title} description");
    event.duration = "1h".to_string();
    event.notice_before = "15m".to_string();
    event
}

fn slots(events: &[Event]) -> BTreeSet<(String, DateTime<Utc>)> {
    events
        .iter()
        .map(|e| (e.user_id.clone(), e.start_date_time))
        .collect()
}

fn titles(events: &[Event]) -> BTreeSet<String> {
    events.iter().map(|e| e.title.clone()).collect()
}

fn set<const N: usize>(items: [&str; N]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn with_each_backend(check: impl Fn(&dyn EventStore)) {
    let memory = MemoryEventStore::new();
    check(&memory);

    let conn = open_db_in_memory().unwrap();
    let sqlite = SqliteEventStore::new(&conn);
    check(&sqlite);
}

#[test]
fn get_events_returns_exactly_the_added_set() {
    with_each_backend(|store| {
        let added = vec![
            event("user1", "a", at(2025, 6, 13, 10, 0, 0)),
            event("user1", "b", at(2025, 6, 13, 11, 0, 0)),
            event("user2", "c", at(2025, 6, 13, 10, 0, 0)),
            event("user3", "d", at(2024, 1, 1, 0, 0, 0)),
        ];
        for e in &added {
            store.add_event(e).unwrap();
        }

        let loaded = store.get_events().unwrap();
        assert_eq!(loaded.len(), added.len());
        assert_eq!(slots(&loaded), slots(&added));
        assert!(loaded.iter().all(|e| e.event_id > 0));

        let stored = loaded.iter().find(|e| e.title == "a").unwrap();
        assert_eq!(stored.description, "a description");
        assert_eq!(stored.duration, "1h");
        assert_eq!(stored.notice_before, "15m");
    });
}

#[test]
fn duplicate_slot_is_slot_busy_and_leaves_store_unchanged() {
    with_each_backend(|store| {
        let start = at(2025, 5, 13, 15, 0, 0);
        store.add_event(&event("u1", "meeting", start)).unwrap();

        let err = store
            .add_event(&event("u1", "other meeting", start))
            .unwrap_err();
        assert!(matches!(err, StoreError::SlotBusy { ref user_id, start: s } if user_id == "u1" && s == start));

        let loaded = store.get_events().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "meeting");
    });
}

#[test]
fn same_start_for_different_users_is_allowed() {
    with_each_backend(|store| {
        let start = at(2025, 5, 13, 15, 0, 0);
        store.add_event(&event("u1", "a", start)).unwrap();
        store.add_event(&event("u2", "b", start)).unwrap();
        assert_eq!(store.get_events().unwrap().len(), 2);
    });
}

#[test]
fn empty_user_id_is_rejected() {
    with_each_backend(|store| {
        let err = store
            .add_event(&event("", "anonymous", at(2025, 5, 13, 15, 0, 0)))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.get_events().unwrap().is_empty());
    });
}

#[test]
fn update_with_empty_user_id_is_rejected_before_lookup() {
    with_each_backend(|store| {
        let start = at(2025, 5, 13, 15, 0, 0);
        store.add_event(&event("u1", "kept", start)).unwrap();

        let err = store.update_event(&event("  ", "renamed", start)).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(titles(&store.get_events().unwrap()), set(["kept"]));
    });
}

#[test]
fn update_changes_only_mutable_fields() {
    with_each_backend(|store| {
        let start = at(2025, 6, 13, 10, 0, 0);
        let mut original = event("user1", "call", start);
        original.created_at = at(2025, 6, 1, 8, 0, 0);
        let id = store.add_event(&original).unwrap();

        let mut changed = event("user1", "updated call", start);
        changed.description = "new agenda".to_string();
        changed.duration = "2h".to_string();
        changed.notice_before = "30m".to_string();
        changed.created_at = at(2030, 1, 1, 0, 0, 0);
        changed.event_id = 9999;
        store.update_event(&changed).unwrap();

        let loaded = store.get_events().unwrap();
        assert_eq!(loaded.len(), 1);
        let stored = &loaded[0];
        assert_eq!(stored.event_id, id);
        assert_eq!(stored.title, "updated call");
        assert_eq!(stored.description, "new agenda");
        assert_eq!(stored.duration, "2h");
        assert_eq!(stored.notice_before, "30m");
        assert_eq!(stored.created_at, at(2025, 6, 1, 8, 0, 0));
        assert_eq!(stored.start_date_time, start);
    });
}

#[test]
fn update_or_delete_missing_slot_is_not_found_and_leaves_store_unchanged() {
    with_each_backend(|store| {
        let start = at(2025, 6, 13, 10, 0, 0);
        store.add_event(&event("user1", "kept", start)).unwrap();

        let other_start = start + Duration::minutes(1);
        let update_err = store
            .update_event(&event("user1", "ghost", other_start))
            .unwrap_err();
        assert!(matches!(update_err, StoreError::NotFound { .. }));

        let delete_err = store.delete_event("user2", start).unwrap_err();
        assert!(matches!(delete_err, StoreError::NotFound { ref user_id, .. } if user_id == "user2"));

        let loaded = store.get_events().unwrap();
        assert_eq!(titles(&loaded), set(["kept"]));
    });
}

#[test]
fn day_query_and_single_delete_scenario() {
    with_each_backend(|store| {
        store
            .add_event(&event("user1", "A", at(2025, 6, 13, 10, 0, 0)))
            .unwrap();
        store
            .add_event(&event("user1", "B", at(2025, 6, 13, 11, 0, 0)))
            .unwrap();

        let day = store.get_events_by_day(at(2025, 6, 13, 0, 0, 0)).unwrap();
        assert_eq!(titles(&day), set(["A", "B"]));

        store.delete_event("user1", at(2025, 6, 13, 10, 0, 0)).unwrap();
        assert_eq!(titles(&store.get_events().unwrap()), set(["B"]));
    });
}

#[test]
fn day_query_excludes_one_second_outside_boundaries() {
    with_each_backend(|store| {
        store
            .add_event(&event("u", "before", at(2025, 6, 12, 23, 59, 59)))
            .unwrap();
        store
            .add_event(&event("u", "first", at(2025, 6, 13, 0, 0, 0)))
            .unwrap();
        store
            .add_event(&event("u", "last", at(2025, 6, 13, 23, 59, 59)))
            .unwrap();
        store
            .add_event(&event("u", "after", at(2025, 6, 14, 0, 0, 0)))
            .unwrap();

        let day = store.get_events_by_day(at(2025, 6, 13, 17, 45, 0)).unwrap();
        assert_eq!(titles(&day), set(["first", "last"]));
    });
}

#[test]
fn week_query_spans_monday_to_next_monday() {
    with_each_backend(|store| {
        store
            .add_event(&event("u", "sunday before", at(2025, 6, 8, 23, 59, 59)))
            .unwrap();
        store
            .add_event(&event("u", "monday", at(2025, 6, 9, 0, 0, 0)))
            .unwrap();
        store
            .add_event(&event("u", "sunday", at(2025, 6, 15, 23, 59, 59)))
            .unwrap();
        store
            .add_event(&event("u", "next monday", at(2025, 6, 16, 0, 0, 0)))
            .unwrap();

        let week = store.get_events_by_week(at(2025, 6, 13, 12, 0, 0)).unwrap();
        assert_eq!(titles(&week), set(["monday", "sunday"]));
    });
}

#[test]
fn week_query_crosses_year_boundary() {
    with_each_backend(|store| {
        // ISO week 1 of 2026 runs Mon 2025-12-29 .. Sun 2026-01-04.
        store
            .add_event(&event("u", "december", at(2025, 12, 29, 9, 0, 0)))
            .unwrap();
        store
            .add_event(&event("u", "january", at(2026, 1, 4, 9, 0, 0)))
            .unwrap();
        store
            .add_event(&event("u", "later", at(2026, 1, 5, 9, 0, 0)))
            .unwrap();

        let week = store.get_events_by_week(at(2026, 1, 1, 0, 0, 0)).unwrap();
        assert_eq!(titles(&week), set(["december", "january"]));
    });
}

#[test]
fn month_query_matches_year_and_month() {
    with_each_backend(|store| {
        store
            .add_event(&event("u", "may end", at(2025, 5, 31, 23, 59, 59)))
            .unwrap();
        store
            .add_event(&event("u", "june start", at(2025, 6, 1, 0, 0, 0)))
            .unwrap();
        store
            .add_event(&event("u", "june end", at(2025, 6, 30, 23, 59, 59)))
            .unwrap();
        store
            .add_event(&event("u", "july", at(2025, 7, 1, 0, 0, 0)))
            .unwrap();
        store
            .add_event(&event("u", "june last year", at(2024, 6, 15, 0, 0, 0)))
            .unwrap();

        let month = store.get_events_by_month(at(2025, 6, 13, 0, 0, 0)).unwrap();
        assert_eq!(titles(&month), set(["june start", "june end"]));
    });
}

#[test]
fn upcoming_query_is_inclusive_at_from() {
    with_each_backend(|store| {
        let from = at(2025, 6, 13, 10, 0, 0);
        store
            .add_event(&event("u", "past", from - Duration::seconds(1)))
            .unwrap();
        store.add_event(&event("u", "now", from)).unwrap();
        store
            .add_event(&event("v", "future", from + Duration::days(400)))
            .unwrap();

        let upcoming = store.get_upcoming_events(from).unwrap();
        assert_eq!(titles(&upcoming), set(["now", "future"]));
    });
}

#[test]
fn delete_old_events_removes_exactly_those_before_cutoff() {
    with_each_backend(|store| {
        let cutoff = at(2025, 6, 1, 0, 0, 0);
        store
            .add_event(&event("u1", "old", cutoff - Duration::days(30)))
            .unwrap();
        store
            .add_event(&event("u2", "just before", cutoff - Duration::seconds(1)))
            .unwrap();
        store.add_event(&event("u1", "at cutoff", cutoff)).unwrap();
        store
            .add_event(&event("u2", "after", cutoff + Duration::hours(1)))
            .unwrap();

        store.delete_old_events(cutoff).unwrap();
        assert_eq!(
            titles(&store.get_events().unwrap()),
            set(["at cutoff", "after"])
        );

        // Nothing left to delete is still a success.
        store.delete_old_events(cutoff).unwrap();
        assert_eq!(store.get_events().unwrap().len(), 2);
    });
}

#[test]
fn sub_millisecond_starts_share_a_slot_on_both_backends() {
    with_each_backend(|store| {
        let start = at(2025, 6, 13, 10, 0, 0);
        store
            .add_event(&event("u", "first", start + Duration::microseconds(100)))
            .unwrap();

        let err = store
            .add_event(&event("u", "second", start + Duration::microseconds(900)))
            .unwrap_err();
        assert!(matches!(err, StoreError::SlotBusy { .. }));

        store.delete_event("u", start).unwrap();
        assert!(store.get_events().unwrap().is_empty());
    });
}
