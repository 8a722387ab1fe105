//! In-process event store.
//!
//! # Responsibility
//! - Hold events in a per-user map guarded by one reader/writer lock.
//! - Mirror the relational backend's query semantics exactly.
//!
//! # Invariants
//! - Read queries take the shared lock; mutations take the exclusive lock.
//! - No lock is acquired re-entrantly and no lock is held across a call out
//!   of this module.
//! - Each user's list is sorted by start; empty lists are removed.

use crate::model::event::{Event, EventId};
use crate::store::{EventStore, StoreError, StoreResult};
use crate::window::{
    day_containing, epoch_ms, iso_week_containing, month_containing, upcoming_from, TimeWindow,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Inner {
    events: HashMap<String, Vec<Event>>,
    last_id: EventId,
}

/// Concurrent in-memory event store.
///
/// Construct one instance and share it by reference with the service and
/// the scheduler.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    inner: RwLock<Inner>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events across all users.
    pub fn len(&self) -> usize {
        self.inner.read().events.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn collect_in(&self, window: TimeWindow) -> Vec<Event> {
        let inner = self.inner.read();
        inner
            .events
            .values()
            .flatten()
            .filter(|event| window.contains(event.start_date_time))
            .cloned()
            .collect()
    }
}

impl EventStore for MemoryEventStore {
    fn add_event(&self, event: &Event) -> StoreResult<EventId> {
        event.validate()?;
        let mut stored = event.normalized();

        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let start_ms = epoch_ms(stored.start_date_time);
        let user_events = inner.events.entry(stored.user_id.clone()).or_default();
        let position =
            match user_events.binary_search_by_key(&start_ms, |e| epoch_ms(e.start_date_time)) {
                Ok(_) => {
                    return Err(StoreError::SlotBusy {
                        user_id: stored.user_id,
                        start: stored.start_date_time,
                    });
                }
                Err(position) => position,
            };

        inner.last_id += 1;
        let id = inner.last_id;
        stored.event_id = id;
        user_events.insert(position, stored);
        Ok(id)
    }

    fn update_event(&self, event: &Event) -> StoreResult<()> {
        event.validate()?;
        let mut inner = self.inner.write();
        let target = inner
            .events
            .get_mut(&event.user_id)
            .and_then(|events| {
                events
                    .iter_mut()
                    .find(|e| e.occupies(&event.user_id, event.start_date_time))
            })
            .ok_or_else(|| StoreError::NotFound {
                user_id: event.user_id.clone(),
                start: event.start_date_time,
            })?;

        target.apply_mutable_fields(event);
        Ok(())
    }

    fn delete_event(&self, user_id: &str, start: DateTime<Utc>) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let not_found = || StoreError::NotFound {
            user_id: user_id.to_string(),
            start,
        };

        let events = inner.events.get_mut(user_id).ok_or_else(not_found)?;
        let index = events
            .iter()
            .position(|e| e.occupies(user_id, start))
            .ok_or_else(not_found)?;
        events.remove(index);
        if events.is_empty() {
            inner.events.remove(user_id);
        }
        Ok(())
    }

    fn delete_old_events(&self, cutoff: DateTime<Utc>) -> StoreResult<()> {
        let cutoff_ms = epoch_ms(cutoff);
        let mut inner = self.inner.write();
        inner.events.retain(|_, events| {
            events.retain(|e| epoch_ms(e.start_date_time) >= cutoff_ms);
            !events.is_empty()
        });
        Ok(())
    }

    fn get_events(&self) -> StoreResult<Vec<Event>> {
        let inner = self.inner.read();
        Ok(inner.events.values().flatten().cloned().collect())
    }

    fn get_upcoming_events(&self, from: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        Ok(self.collect_in(upcoming_from(from)))
    }

    fn get_events_by_day(&self, date: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        Ok(self.collect_in(day_containing(date)))
    }

    fn get_events_by_week(&self, date: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        Ok(self.collect_in(iso_week_containing(date)))
    }

    fn get_events_by_month(&self, date: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        let window = month_containing(date).ok_or(StoreError::DateOutOfRange(date))?;
        Ok(self.collect_in(window))
    }
}
