//! Timer-plus-cancellation loop driving `Scheduler` ticks.
//!
//! # Invariants
//! - Single-threaded: the loop blocks on one wait over two sources (the
//!   next deadline, the shutdown signal) and runs a tick to completion
//!   before waiting again.
//! - Cancellation is cooperative. A running tick is never interrupted.
//! - Deadlines are fixed-rate. Deadlines that pass while a tick is still
//!   running are dropped, never queued.

use super::Scheduler;
use crate::mq::Publisher;
use crate::store::EventStore;
use log::{debug, info};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Cloneable trigger for stopping a running loop.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Sender<()>,
}

impl ShutdownHandle {
    /// Requests loop exit. Safe to call more than once or after the loop ended.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

/// Receiving half watched by `run_loop`.
///
/// Dropping every `ShutdownHandle` also counts as a shutdown request.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: Receiver<()>,
}

enum Wake {
    TimerFired,
    Shutdown,
}

impl ShutdownSignal {
    fn wait(&self, timeout: Duration) -> Wake {
        match self.rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => Wake::TimerFired,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => Wake::Shutdown,
        }
    }
}

/// Creates a connected shutdown handle/signal pair.
pub fn shutdown_channel() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = mpsc::channel();
    (ShutdownHandle { tx }, ShutdownSignal { rx })
}

/// Counters returned when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    /// Ticks that ran (including ones whose fetch failed).
    pub ticks: u64,
    /// Ticks abandoned because the upcoming-events fetch failed.
    pub failed: u64,
    /// Deadlines dropped because a tick overran them.
    pub skipped: u64,
}

/// Runs `scheduler` once per `interval` until `signal` fires.
///
/// The first tick fires one full interval after the call.
pub fn run_loop<S, P>(
    scheduler: &Scheduler<S, P>,
    interval: Duration,
    signal: &ShutdownSignal,
) -> LoopSummary
where
    S: EventStore,
    P: Publisher,
{
    let interval = interval.max(MIN_INTERVAL);
    let mut summary = LoopSummary::default();
    let mut deadline = Instant::now() + interval;
    info!(
        "event=scheduler_loop module=scheduler status=start interval_ms={} topic={}",
        interval.as_millis(),
        scheduler.topic()
    );

    loop {
        let timeout = deadline.saturating_duration_since(Instant::now());
        if let Wake::Shutdown = signal.wait(timeout) {
            break;
        }

        // Failures are already logged inside the tick; the loop keeps going.
        if scheduler.run().is_err() {
            summary.failed += 1;
        }
        summary.ticks += 1;

        deadline += interval;
        let now = Instant::now();
        while deadline <= now {
            deadline += interval;
            summary.skipped += 1;
            debug!("event=scheduler_loop module=scheduler status=skip reason=tick_overrun");
        }
    }

    info!(
        "event=scheduler_loop module=scheduler status=stop ticks={} failed={} skipped={}",
        summary.ticks, summary.failed, summary.skipped
    );
    summary
}
