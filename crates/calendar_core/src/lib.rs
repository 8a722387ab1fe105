//! Calendar event store and reminder scheduling core.
//!
//! Events are written and queried through `EventService`, persisted by an
//! `EventStore` backend, and turned into reminder notifications by
//! `Scheduler`.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod mq;
pub mod notifier;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod window;

pub use config::{CalendarConfig, ConfigError, StorageKind};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LogLevel,
    LoggingError,
};
pub use model::event::{Event, EventId, EventValidationError, Slot};
pub use mq::{Consumer, LogPublisher, MemoryQueue, PublishError, Publisher};
pub use notifier::Notification;
pub use scheduler::{
    run_loop, shutdown_channel, CleanupOutcome, DispatchError, DispatchFailure, LoopSummary,
    Scheduler, ShutdownHandle, ShutdownSignal, TickReport,
};
pub use service::event_service::{CreateEventRequest, EventService, UpdateEventRequest};
pub use store::{EventStore, MemoryEventStore, SqliteEventStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
