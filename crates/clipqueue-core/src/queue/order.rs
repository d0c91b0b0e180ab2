//! Which end of the queue `paste_next` consumes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::QueueError;

/// Queue order strategy.  Exposed to configuration and UI only as the
/// literal strings `"LIFO"` and `"FIFO"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStrategy {
    /// Newest item first (tail of the queue).
    #[default]
    #[serde(rename = "LIFO")]
    Lifo,
    /// Oldest item first (head of the queue).
    #[serde(rename = "FIFO")]
    Fifo,
}

impl OrderStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStrategy::Lifo => "LIFO",
            OrderStrategy::Fifo => "FIFO",
        }
    }

    /// The other strategy.
    pub fn toggled(self) -> Self {
        match self {
            OrderStrategy::Lifo => OrderStrategy::Fifo,
            OrderStrategy::Fifo => OrderStrategy::Lifo,
        }
    }
}

impl fmt::Display for OrderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStrategy {
    type Err = QueueError;

    /// Accepts exactly `"LIFO"` or `"FIFO"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIFO" => Ok(OrderStrategy::Lifo),
            "FIFO" => Ok(OrderStrategy::Fifo),
            other => Err(QueueError::InvalidOrder(other.to_string())),
        }
    }
}
