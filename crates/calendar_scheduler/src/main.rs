//! Reminder scheduler process.
//!
//! # Responsibility
//! - Compose config, logging, event store backend and publisher.
//! - Drive scheduler ticks until SIGINT / SIGTERM.

use anyhow::{Context, Result};
use calendar_core::db::open_db;
use calendar_core::{
    core_version, init_logging_from_config, run_loop, shutdown_channel, CalendarConfig,
    EventStore, LogPublisher, MemoryEventStore, Publisher, Scheduler, ShutdownHandle,
    SqliteEventStore, StorageKind,
};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::path::PathBuf;

/// Periodically publishes reminders for upcoming calendar events.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "configs/config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the core version and exit
    Version,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(Command::Version) = args.command {
        println!("calendar_core version={}", core_version());
        return Ok(());
    }

    let config = CalendarConfig::from_file(&args.config)
        .with_context(|| format!("cannot load config `{}`", args.config.display()))?;
    init_logging_from_config(&config.logger).context("cannot initialize logging")?;
    info!(
        "event=scheduler_config module=main status=ok storage={:?} topic={} interval_s={} retention_days={}",
        config.storage.kind,
        config.queue.topic,
        config.scheduler.interval_seconds,
        config.scheduler.retention_days
    );

    let publisher = LogPublisher::new();
    let outcome = match config.storage.kind {
        StorageKind::Memory => {
            warn!(
                "event=scheduler_storage module=main status=warn storage=memory reason=nothing_in_this_process_writes_events"
            );
            run_with_store(&config, MemoryEventStore::new(), &publisher)
        }
        StorageKind::Sql => {
            let conn = open_db(&config.storage.path)
                .with_context(|| format!("DB connect failed: `{}`", config.storage.path))?;
            run_with_store(&config, SqliteEventStore::new(&conn), &publisher)
        }
    };

    if let Err(err) = publisher.close() {
        error!("event=publisher_close module=main status=error error={err}");
    }
    outcome
}

fn run_with_store<S: EventStore>(
    config: &CalendarConfig,
    store: S,
    publisher: &LogPublisher,
) -> Result<()> {
    let (handle, signal) = shutdown_channel();
    install_shutdown_handler(handle)?;

    let scheduler = Scheduler::new(
        store,
        publisher,
        config.queue.topic.clone(),
        config.scheduler.retention_days,
    );
    let summary = run_loop(&scheduler, config.scheduler.interval(), &signal);
    info!(
        "event=scheduler_exit module=main status=ok ticks={} failed={} skipped={}",
        summary.ticks, summary.failed, summary.skipped
    );
    Ok(())
}

/// Routes SIGINT, SIGTERM and SIGHUP into `handle`.
fn install_shutdown_handler(handle: ShutdownHandle) -> Result<()> {
    ctrlc::set_handler(move || handle.trigger()).context("cannot install signal handler")
}
