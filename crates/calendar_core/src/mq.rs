//! Message channel capability used by the scheduler.
//!
//! # Responsibility
//! - Define the `Publisher`/`Consumer` seams any transport can satisfy.
//! - Provide a log-sink publisher and an in-process topic queue.
//!
//! # Invariants
//! - Publishing after `close()` fails with `PublishError::Closed`.
//! - Delivery is at-least-once at best; nothing here retries.

use log::info;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};

/// Publish/close failure reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    Closed,
    Transport(String),
}

impl Display for PublishError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "publisher is closed"),
            Self::Transport(message) => write!(f, "publish transport error: {message}"),
        }
    }
}

impl Error for PublishError {}

/// Outbound side of the message channel.
pub trait Publisher {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;
    fn close(&self) -> Result<(), PublishError>;
}

impl<T: Publisher + ?Sized> Publisher for &T {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        (**self).publish(topic, payload)
    }

    fn close(&self) -> Result<(), PublishError> {
        (**self).close()
    }
}

/// Inbound side of the message channel.
pub trait Consumer {
    /// Hands every pending message on `topic` to `handler` and returns how
    /// many were delivered.
    fn consume(&self, topic: &str, handler: &mut dyn FnMut(&[u8])) -> usize;
}

/// Publisher that writes every message to the process log.
#[derive(Debug, Default)]
pub struct LogPublisher {
    closed: AtomicBool,
}

impl LogPublisher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Publisher for LogPublisher {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PublishError::Closed);
        }
        info!(
            "event=notification_published module=mq status=ok topic={} payload={}",
            topic,
            String::from_utf8_lossy(payload)
        );
        Ok(())
    }

    fn close(&self) -> Result<(), PublishError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// In-process FIFO queues keyed by topic.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    topics: Mutex<HashMap<String, VecDeque<Vec<u8>>>>,
    closed: AtomicBool,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages waiting on `topic`.
    pub fn pending(&self, topic: &str) -> usize {
        self.topics.lock().get(topic).map_or(0, VecDeque::len)
    }
}

impl Publisher for MemoryQueue {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PublishError::Closed);
        }
        self.topics
            .lock()
            .entry(topic.to_string())
            .or_default()
            .push_back(payload.to_vec());
        Ok(())
    }

    fn close(&self) -> Result<(), PublishError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

impl Consumer for MemoryQueue {
    fn consume(&self, topic: &str, handler: &mut dyn FnMut(&[u8])) -> usize {
        // Drain under the lock, deliver outside it.
        let drained: Vec<Vec<u8>> = match self.topics.lock().get_mut(topic) {
            Some(queue) => queue.drain(..).collect(),
            None => Vec::new(),
        };
        for message in &drained {
            handler(message);
        }
        drained.len()
    }
}
