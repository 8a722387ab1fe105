//! Reminder notification model.
//!
//! A `Notification` is built per due event on each scheduler tick, encoded
//! as JSON and handed to a `Publisher`. It is never persisted.

use crate::model::event::{Event, EventId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only projection of an event sent to the message channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "id")]
    pub event_id: EventId,
    pub title: String,
    #[serde(rename = "startAt")]
    pub start_at: DateTime<Utc>,
    #[serde(rename = "userId")]
    pub user_id: String,
}

impl Notification {
    /// Encodes this notification as a JSON payload.
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decodes a payload produced by `to_payload`.
    pub fn from_payload(payload: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(payload)
    }
}

impl From<&Event> for Notification {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.event_id,
            title: event.title.clone(),
            start_at: event.start_date_time,
            user_id: event.user_id.clone(),
        }
    }
}
