//! SQLite-backed event store.
//!
//! # Responsibility
//! - Map the event store contract onto the `events` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Slot uniqueness is enforced by the `(user_id, start_date_time)`
//!   constraint, not by a read-before-write check.
//! - Only a unique-constraint violation on that pair maps to `SlotBusy`.
//! - Every operation is one auto-committing statement. Compound callers get
//!   no atomicity across calls.
//! - Instants are persisted as INTEGER epoch milliseconds.

use crate::model::event::{Event, EventId};
use crate::store::{EventStore, StoreError, StoreResult};
use crate::window::{
    day_containing, epoch_ms, from_epoch_ms, iso_week_containing, month_containing,
    upcoming_from, TimeWindow,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, Row};

const EVENT_SELECT_SQL: &str = "SELECT
    event_id,
    user_id,
    title,
    description,
    start_date_time,
    duration,
    notice_before,
    created_at
FROM events";

const SLOT_CONSTRAINT_COLUMNS: &str = "events.user_id, events.start_date_time";

/// SQLite event store borrowing a migrated connection.
pub struct SqliteEventStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventStore<'conn> {
    /// Wraps a connection returned by `db::open_db` or `db::open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn select_in(&self, window: TimeWindow) -> StoreResult<Vec<Event>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{EVENT_SELECT_SQL}
             WHERE start_date_time >= ?1
               AND (?2 IS NULL OR start_date_time < ?2)
             ORDER BY start_date_time ASC, user_id ASC;"
        ))?;

        let mut rows = stmt.query(params![window.start_ms, window.end_ms])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }
}

impl EventStore for SqliteEventStore<'_> {
    fn add_event(&self, event: &Event) -> StoreResult<EventId> {
        event.validate()?;

        let inserted = self.conn.execute(
            "INSERT INTO events (
                user_id,
                title,
                description,
                start_date_time,
                duration,
                notice_before,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                event.user_id.as_str(),
                event.title.as_str(),
                event.description.as_str(),
                epoch_ms(event.start_date_time),
                event.duration.as_str(),
                event.notice_before.as_str(),
                epoch_ms(event.created_at),
            ],
        );

        match inserted {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(err) if is_slot_violation(&err) => Err(StoreError::SlotBusy {
                user_id: event.user_id.clone(),
                start: event.start_date_time,
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn update_event(&self, event: &Event) -> StoreResult<()> {
        event.validate()?;

        let changed = self.conn.execute(
            "UPDATE events
             SET
                title = ?1,
                description = ?2,
                duration = ?3,
                notice_before = ?4
             WHERE user_id = ?5
               AND start_date_time = ?6;",
            params![
                event.title.as_str(),
                event.description.as_str(),
                event.duration.as_str(),
                event.notice_before.as_str(),
                event.user_id.as_str(),
                epoch_ms(event.start_date_time),
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                user_id: event.user_id.clone(),
                start: event.start_date_time,
            });
        }
        Ok(())
    }

    fn delete_event(&self, user_id: &str, start: DateTime<Utc>) -> StoreResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM events WHERE user_id = ?1 AND start_date_time = ?2;",
            params![user_id, epoch_ms(start)],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                user_id: user_id.to_string(),
                start,
            });
        }
        Ok(())
    }

    fn delete_old_events(&self, cutoff: DateTime<Utc>) -> StoreResult<()> {
        self.conn.execute(
            "DELETE FROM events WHERE start_date_time < ?1;",
            [epoch_ms(cutoff)],
        )?;
        Ok(())
    }

    fn get_events(&self) -> StoreResult<Vec<Event>> {
        let mut stmt = self.conn.prepare_cached(EVENT_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }

    fn get_upcoming_events(&self, from: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        self.select_in(upcoming_from(from))
    }

    fn get_events_by_day(&self, date: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        self.select_in(day_containing(date))
    }

    fn get_events_by_week(&self, date: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        self.select_in(iso_week_containing(date))
    }

    fn get_events_by_month(&self, date: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        let window = month_containing(date).ok_or(StoreError::DateOutOfRange(date))?;
        self.select_in(window)
    }
}

/// Returns whether `err` is the `(user_id, start_date_time)` unique violation.
///
/// Other constraint failures (NOT NULL, primary key) are left to surface as
/// connectivity errors.
fn is_slot_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, message) => {
            failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                && message
                    .as_deref()
                    .map_or(true, |text| text.contains(SLOT_CONSTRAINT_COLUMNS))
        }
        _ => false,
    }
}

fn parse_event_row(row: &Row<'_>) -> StoreResult<Event> {
    let start_ms: i64 = row.get("start_date_time")?;
    let start_date_time = from_epoch_ms(start_ms).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid timestamp `{start_ms}` in events.start_date_time"
        ))
    })?;

    let created_ms: i64 = row.get("created_at")?;
    let created_at = from_epoch_ms(created_ms).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid timestamp `{created_ms}` in events.created_at"))
    })?;

    Ok(Event {
        event_id: row.get("event_id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        start_date_time,
        duration: row.get("duration")?,
        notice_before: row.get("notice_before")?,
        created_at,
    })
}
