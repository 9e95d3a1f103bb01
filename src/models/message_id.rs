//! Broker-assigned message position.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a message in the topic's log.
///
/// `partition` and `batch_index` are `-1` when not applicable, matching the
/// broker's encoding for non-partitioned topics and non-batched entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId {
    pub ledger_id: u64,
    pub entry_id: u64,
    #[serde(default = "default_index")]
    pub partition: i32,
    #[serde(default = "default_index")]
    pub batch_index: i32,
}

fn default_index() -> i32 {
    -1
}

impl MessageId {
    pub fn new(ledger_id: u64, entry_id: u64) -> Self {
        Self {
            ledger_id,
            entry_id,
            partition: -1,
            batch_index: -1,
        }
    }

    pub fn with_partition(mut self, partition: i32) -> Self {
        self.partition = partition;
        self
    }

    /// Whether this id points inside a batched entry.
    pub fn is_batched(&self) -> bool {
        self.batch_index >= 0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.ledger_id, self.entry_id, self.partition, self.batch_index
        )
    }
}
