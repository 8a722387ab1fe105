//! Calendar event domain model.
//!
//! # Responsibility
//! - Define the canonical record persisted by every event store backend.
//! - Expose the natural key (`user_id`, `start_date_time`) used for slot
//!   uniqueness checks.
//!
//! # Invariants
//! - `(user_id, start_date_time)` is unique per store instance.
//! - Instants are stored at millisecond resolution.
//! - `created_at` is stamped by the service layer, never by callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::window::{epoch_ms, truncate_to_millis};

/// Store-assigned surrogate identifier. `0` means "not assigned yet".
pub type EventId = i64;

/// Scheduled calendar entry owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Surrogate id assigned by the store on insert.
    pub event_id: EventId,
    /// Owner key, first half of the natural key.
    pub user_id: String,
    pub title: String,
    pub description: String,
    /// Instant the event begins, second half of the natural key.
    pub start_date_time: DateTime<Utc>,
    /// Opaque duration descriptor (e.g. `1h30m`). Not parsed by core.
    pub duration: String,
    /// Opaque reminder lead-time descriptor (e.g. `15m`). Not parsed by core.
    pub notice_before: String,
    /// Creation timestamp stamped by `EventService`.
    pub created_at: DateTime<Utc>,
}

/// Natural key identifying an event's slot.
///
/// The start is kept as epoch milliseconds so both backends compare it the
/// same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub user_id: String,
    pub start_ms: i64,
}

impl Event {
    /// Creates an unsaved event with empty optional text fields.
    ///
    /// `created_at` defaults to `start_date_time` until the service stamps it.
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        start_date_time: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: 0,
            user_id: user_id.into(),
            title: title.into(),
            description: String::new(),
            start_date_time,
            duration: String::new(),
            notice_before: String::new(),
            created_at: start_date_time,
        }
    }

    /// Returns the natural key of this event.
    pub fn slot(&self) -> Slot {
        Slot {
            user_id: self.user_id.clone(),
            start_ms: epoch_ms(self.start_date_time),
        }
    }

    /// Returns whether this event occupies the given user/start slot.
    pub fn occupies(&self, user_id: &str, start: DateTime<Utc>) -> bool {
        self.user_id == user_id && epoch_ms(self.start_date_time) == epoch_ms(start)
    }

    /// Validates write-time invariants.
    ///
    /// # Errors
    /// - Returns `EmptyUserId` when `user_id` is empty or whitespace.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(EventValidationError::EmptyUserId);
        }
        Ok(())
    }

    /// Returns a copy with both instants truncated to whole milliseconds.
    pub(crate) fn normalized(&self) -> Self {
        Self {
            start_date_time: truncate_to_millis(self.start_date_time),
            created_at: truncate_to_millis(self.created_at),
            ..self.clone()
        }
    }

    /// Copies the fields an update is allowed to change.
    pub(crate) fn apply_mutable_fields(&mut self, source: &Event) {
        self.title = source.title.clone();
        self.description = source.description.clone();
        self.duration = source.duration.clone();
        self.notice_before = source.notice_before.clone();
    }
}

/// Validation failure raised before a write reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    EmptyUserId,
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUserId => write!(f, "event user_id must not be empty"),
        }
    }
}

impl Error for EventValidationError {}
