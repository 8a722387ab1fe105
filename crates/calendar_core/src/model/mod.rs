//! Calendar domain model.
//!
//! # Invariants
//! - Every event is identified by its slot `(user_id, start_date_time)`;
//!   `event_id` is a store-assigned surrogate.

pub mod event;
