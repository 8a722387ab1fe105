//! Event use-case service.
//!
//! # Responsibility
//! - Provide the create/update/delete/list entry points transport layers
//!   call into.
//! - Assemble `Event` records from primitive inputs.
//!
//! # Invariants
//! - `created_at` is stamped here at creation time and never taken from
//!   callers.
//! - Store errors are returned unchanged. No retry, no cache.

use crate::model::event::{Event, EventId};
use crate::store::{EventStore, StoreResult};
use chrono::{DateTime, Utc};

/// Request model for creating an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEventRequest {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub start_date_time: DateTime<Utc>,
    pub duration: String,
    pub notice_before: String,
}

/// Request model for updating the mutable fields of an event.
///
/// `user_id` and `start_date_time` select the slot; they are never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEventRequest {
    pub user_id: String,
    pub start_date_time: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub notice_before: String,
}

/// Application façade over an event store.
pub struct EventService<S: EventStore> {
    store: S,
}

impl<S: EventStore> EventService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates one event and returns the store-assigned id.
    ///
    /// # Errors
    /// - `SlotBusy` when the user already has an event at this start.
    pub fn create_event(&self, request: &CreateEventRequest) -> StoreResult<EventId> {
        let event = Event {
            event_id: 0,
            user_id: request.user_id.clone(),
            title: request.title.clone(),
            description: request.description.clone(),
            start_date_time: request.start_date_time,
            duration: request.duration.clone(),
            notice_before: request.notice_before.clone(),
            created_at: Utc::now(),
        };
        self.store.add_event(&event)
    }

    /// Updates one event in place.
    ///
    /// Returns `NotFound` unchanged when the slot is empty.
    pub fn update_event(&self, request: &UpdateEventRequest) -> StoreResult<()> {
        let mut event = Event::new(
            request.user_id.clone(),
            request.title.clone(),
            request.start_date_time,
        );
        event.description = request.description.clone();
        event.duration = request.duration.clone();
        event.notice_before = request.notice_before.clone();
        self.store.update_event(&event)
    }

    pub fn delete_event(&self, user_id: &str, start: DateTime<Utc>) -> StoreResult<()> {
        self.store.delete_event(user_id, start)
    }

    pub fn list_events(&self) -> StoreResult<Vec<Event>> {
        self.store.get_events()
    }

    pub fn list_upcoming(&self, from: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        self.store.get_upcoming_events(from)
    }

    /// Lists events within the UTC day containing `date`.
    pub fn list_day(&self, date: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        self.store.get_events_by_day(date)
    }

    /// Lists events within the ISO week (Monday start) containing `date`.
    pub fn list_week(&self, date: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        self.store.get_events_by_week(date)
    }

    /// Lists events within the UTC calendar month containing `date`.
    pub fn list_month(&self, date: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        self.store.get_events_by_month(date)
    }
}
