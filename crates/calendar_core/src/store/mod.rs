//! Event store contract and its two backends.
//!
//! # Responsibility
//! - Define the persistence capability consumed by `EventService` and
//!   `Scheduler`.
//! - Return semantic errors (`SlotBusy`, `NotFound`) in addition to backend
//!   transport errors.
//!
//! # Invariants
//! - `(user_id, start_date_time)` is unique per store instance.
//! - Range queries are evaluated over `crate::window::TimeWindow` so that
//!   `MemoryEventStore` and `SqliteEventStore` select identical rows.
//! - Callers receive owned copies, never references into store state.

use crate::db::DbError;
use crate::model::event::{Event, EventId, EventValidationError};
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryEventStore;
pub use sqlite::SqliteEventStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error taxonomy shared by every event store backend.
#[derive(Debug)]
pub enum StoreError {
    /// Another event already occupies this user/start slot.
    SlotBusy {
        user_id: String,
        start: DateTime<Utc>,
    },
    /// No event occupies this user/start slot.
    NotFound {
        user_id: String,
        start: DateTime<Utc>,
    },
    /// Backend could not be reached or rejected the statement.
    Connectivity(DbError),
    Validation(EventValidationError),
    /// Persisted row could not be decoded into an `Event`.
    InvalidData(String),
    /// Query date is outside the representable calendar range.
    DateOutOfRange(DateTime<Utc>),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SlotBusy { user_id, start } => write!(
                f,
                "the selected datetime is already booked: user={user_id} start={}",
                start.to_rfc3339()
            ),
            Self::NotFound { user_id, start } => write!(
                f,
                "event not found: user={user_id} start={}",
                start.to_rfc3339()
            ),
            Self::Connectivity(err) => write!(f, "event store unavailable: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted event data: {message}"),
            Self::DateOutOfRange(date) => {
                write!(f, "date out of supported range: {}", date.to_rfc3339())
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connectivity(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EventValidationError> for StoreError {
    fn from(value: EventValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Connectivity(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Connectivity(DbError::Sqlite(value))
    }
}

/// Persistence capability for calendar events.
pub trait EventStore {
    /// Inserts a new event and returns its assigned id.
    ///
    /// Fails with `SlotBusy` when the natural key is taken.
    fn add_event(&self, event: &Event) -> StoreResult<EventId>;
    /// Replaces title, description, duration and notice of the event in the
    /// same slot. Fails with `Validation` for an empty `user_id` and
    /// `NotFound` when the slot is empty.
    fn update_event(&self, event: &Event) -> StoreResult<()>;
    fn delete_event(&self, user_id: &str, start: DateTime<Utc>) -> StoreResult<()>;
    /// Removes every event starting strictly before `cutoff`, across users.
    fn delete_old_events(&self, cutoff: DateTime<Utc>) -> StoreResult<()>;
    fn get_events(&self) -> StoreResult<Vec<Event>>;
    /// Events starting at or after `from`.
    fn get_upcoming_events(&self, from: DateTime<Utc>) -> StoreResult<Vec<Event>>;
    fn get_events_by_day(&self, date: DateTime<Utc>) -> StoreResult<Vec<Event>>;
    fn get_events_by_week(&self, date: DateTime<Utc>) -> StoreResult<Vec<Event>>;
    fn get_events_by_month(&self, date: DateTime<Utc>) -> StoreResult<Vec<Event>>;
}

impl<T: EventStore + ?Sized> EventStore for &T {
    fn add_event(&self, event: &Event) -> StoreResult<EventId> {
        (**self).add_event(event)
    }

    fn update_event(&self, event: &Event) -> StoreResult<()> {
        (**self).update_event(event)
    }

    fn delete_event(&self, user_id: &str, start: DateTime<Utc>) -> StoreResult<()> {
        (**self).delete_event(user_id, start)
    }

    fn delete_old_events(&self, cutoff: DateTime<Utc>) -> StoreResult<()> {
        (**self).delete_old_events(cutoff)
    }

    fn get_events(&self) -> StoreResult<Vec<Event>> {
        (**self).get_events()
    }

    fn get_upcoming_events(&self, from: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        (**self).get_upcoming_events(from)
    }

    fn get_events_by_day(&self, date: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        (**self).get_events_by_day(date)
    }

    fn get_events_by_week(&self, date: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        (**self).get_events_by_week(date)
    }

    fn get_events_by_month(&self, date: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        (**self).get_events_by_month(date)
    }
}
