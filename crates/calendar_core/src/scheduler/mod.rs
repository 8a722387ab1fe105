//! Reminder scheduler.
//!
//! # Responsibility
//! - Turn upcoming events into notifications and publish them.
//! - Prune events older than the retention window.
//!
//! # Invariants
//! - A failed upcoming-events fetch abandons the tick; nothing else runs.
//! - A failed encode or publish skips only that event.
//! - Cleanup runs after dispatch when `retention_days > 0`; its failure is
//!   logged and never aborts the tick.
//! - No state survives between ticks besides the injected store, publisher
//!   and configuration.

use crate::model::event::{Event, EventId};
use crate::mq::{PublishError, Publisher};
use crate::notifier::Notification;
use crate::store::{EventStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};
use std::fmt::{Display, Formatter};

pub mod driver;

pub use driver::{run_loop, shutdown_channel, LoopSummary, ShutdownHandle, ShutdownSignal};

/// Why one due event was not dispatched.
#[derive(Debug)]
pub enum DispatchError {
    Serialization(serde_json::Error),
    Publish(PublishError),
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialization(err) => write!(f, "notification encode failed: {err}"),
            Self::Publish(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            Self::Publish(err) => Some(err),
        }
    }
}

/// Per-event dispatch failure recorded during a tick.
#[derive(Debug)]
pub struct DispatchFailure {
    pub event_id: EventId,
    pub user_id: String,
    pub start: DateTime<Utc>,
    pub error: DispatchError,
}

/// Result of the retention step of a tick.
#[derive(Debug)]
pub enum CleanupOutcome {
    /// Retention window is `0`; the store was not asked to delete anything.
    Disabled,
    Completed { cutoff: DateTime<Utc> },
    /// `cutoff` is `DateTime::MIN_UTC` when `now - retention_days` is not
    /// representable; the store is not called in that case.
    Failed {
        cutoff: DateTime<Utc>,
        error: StoreError,
    },
}

/// Summary of one completed tick.
#[derive(Debug)]
pub struct TickReport {
    pub fetched: usize,
    pub published: usize,
    pub failures: Vec<DispatchFailure>,
    pub cleanup: CleanupOutcome,
}

/// Periodic reminder dispatcher over an event store and a publisher.
pub struct Scheduler<S: EventStore, P: Publisher> {
    store: S,
    publisher: P,
    topic: String,
    retention_days: u32,
}

impl<S: EventStore, P: Publisher> Scheduler<S, P> {
    /// Creates a scheduler. `retention_days = 0` disables cleanup.
    pub fn new(store: S, publisher: P, topic: impl Into<String>, retention_days: u32) -> Self {
        Self {
            store,
            publisher,
            topic: topic.into(),
            retention_days,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }

    /// Runs one tick at the current wall-clock time.
    pub fn run(&self) -> Result<TickReport, StoreError> {
        self.run_at(Utc::now())
    }

    /// Runs one tick as if the current time were `now`.
    ///
    /// # Errors
    /// - Returns the store error when fetching upcoming events fails. The
    ///   tick is abandoned and cleanup does not run.
    pub fn run_at(&self, now: DateTime<Utc>) -> Result<TickReport, StoreError> {
        let events = match self.store.get_upcoming_events(now) {
            Ok(events) => events,
            Err(err) => {
                error!(
                    "event=scheduler_tick module=scheduler status=error stage=fetch error={}",
                    err
                );
                return Err(err);
            }
        };

        let fetched = events.len();
        let mut published = 0;
        let mut failures = Vec::new();
        for event in &events {
            match self.dispatch(event) {
                Ok(()) => published += 1,
                Err(error) => {
                    warn!(
                        "event=notification_dispatch module=scheduler status=error event_id={} user_id={} error={}",
                        event.event_id, event.user_id, error
                    );
                    failures.push(DispatchFailure {
                        event_id: event.event_id,
                        user_id: event.user_id.clone(),
                        start: event.start_date_time,
                        error,
                    });
                }
            }
        }
        info!(
            "event=scheduler_tick module=scheduler status=ok stage=dispatch topic={} fetched={} published={} failed={}",
            self.topic,
            fetched,
            published,
            failures.len()
        );

        let cleanup = self.cleanup(now);
        Ok(TickReport {
            fetched,
            published,
            failures,
            cleanup,
        })
    }

    fn dispatch(&self, event: &Event) -> Result<(), DispatchError> {
        let payload = Notification::from(event)
            .to_payload()
            .map_err(DispatchError::Serialization)?;
        self.publisher
            .publish(&self.topic, &payload)
            .map_err(DispatchError::Publish)
    }

    fn cleanup(&self, now: DateTime<Utc>) -> CleanupOutcome {
        if self.retention_days == 0 {
            return CleanupOutcome::Disabled;
        }

        let Some(cutoff) = Duration::try_days(i64::from(self.retention_days))
            .and_then(|retention| now.checked_sub_signed(retention))
        else {
            error!(
                "event=scheduler_cleanup module=scheduler status=error reason=cutoff_out_of_range retention_days={}",
                self.retention_days
            );
            return CleanupOutcome::Failed {
                cutoff: DateTime::<Utc>::MIN_UTC,
                error: StoreError::DateOutOfRange(now),
            };
        };
        match self.store.delete_old_events(cutoff) {
            Ok(()) => {
                debug!(
                    "event=scheduler_cleanup module=scheduler status=ok cutoff={}",
                    cutoff.to_rfc3339()
                );
                CleanupOutcome::Completed { cutoff }
            }
            Err(error) => {
                error!(
                    "event=scheduler_cleanup module=scheduler status=error cutoff={} error={}",
                    cutoff.to_rfc3339(),
                    error
                );
                CleanupOutcome::Failed { cutoff, error }
            }
        }
    }
}
