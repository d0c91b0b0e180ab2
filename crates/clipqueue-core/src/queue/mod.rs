//! Clipboard queue and history state.
//!
//! [`QueueState`] is the synchronous state machine behind the controller:
//! history with bounded FIFO eviction, the ordered paste queue, the
//! snapshot taken when the queue is enabled, the order strategy and the
//! [`SelfEventRing`].  It performs no I/O; the host drives it under a lock
//! and does clipboard reads and writes around it.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod order;
pub mod self_events;
pub mod state;

pub use order::OrderStrategy;
pub use self_events::SelfEventRing;
pub use state::{QueueState, UpdateOutcome};

/// Errors from queue operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// `remove` was given an index outside `[0, len)`.
    #[error("index {index} out of range for queue of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Order strategy string other than `"LIFO"` / `"FIFO"`.
    #[error("unsupported order strategy: {0} (expected LIFO or FIFO)")]
    InvalidOrder(String),

    /// No history item with the given id.
    #[error("no history item with id {0}")]
    NotFound(String),

    /// Dequeue attempted while queue mode is off.
    #[error("queue mode is disabled")]
    Disabled,

    /// Dequeue attempted on an empty queue.
    #[error("queue is empty")]
    Empty,
}

/// Tunables for [`QueueState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    /// Maximum history length; the oldest entry is evicted first.
    pub history_capacity: usize,
    /// Two updates of the same content closer than this are one echo.
    pub dedup_window: Duration,
    /// Capacity of the self-event ring.
    pub self_event_capacity: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            dedup_window: Duration::from_secs(1),
            self_event_capacity: self_events::DEFAULT_SELF_EVENT_CAPACITY,
        }
    }
}

/// `(enabled, queue length, order)` tuple delivered to state-change listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub enabled: bool,
    pub queue_len: usize,
    pub order: OrderStrategy,
}

impl fmt::Display for QueueStatus {
    /// Tray tooltip text, e.g. `ClipQueue: ON [LIFO] (3)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.enabled {
            write!(f, "ClipQueue: ON [{}] ({})", self.order, self.queue_len)
        } else {
            f.write_str("ClipQueue: OFF")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tooltip_text() {
        let on = QueueStatus {
            enabled: true,
            queue_len: 3,
            order: OrderStrategy::Lifo,
        };
        let off = QueueStatus {
            enabled: false,
            ..on
        };

        assert_eq!(on.to_string(), "ClipQueue: ON [LIFO] (3)");
        assert_eq!(off.to_string(), "ClipQueue: OFF");
    }

    #[test]
    fn test_default_settings() {
        let settings = QueueSettings::default();
        assert_eq!(settings.history_capacity, 50);
        assert_eq!(settings.dedup_window, Duration::from_secs(1));
        assert_eq!(settings.self_event_capacity, 8);
    }
}
