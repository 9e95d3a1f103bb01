//! Receive statistics for a consumer.
//!
//! [`ConsumerStats`] is updated lock-free from the receive path, the listener
//! worker and the reconnect hook. [`ConsumerStatsSnapshot`] is a read-only
//! copy for debugging, tests and dashboards.

use crate::models::Message;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ConsumerStats {
    num_msgs_received: AtomicU64,
    num_bytes_received: AtomicU64,
    num_receive_failed: AtomicU64,
    num_flow_permits_sent: AtomicU64,
    num_stale_discarded: AtomicU64,
    num_listener_failures: AtomicU64,
    num_reconnects: AtomicU64,
}

impl ConsumerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_num_msgs_received(&self, message: &Message) {
        self.record_received(message.payload().len());
    }

    pub(crate) fn record_received(&self, payload_len: usize) {
        self.num_msgs_received.fetch_add(1, Ordering::Relaxed);
        self.num_bytes_received
            .fetch_add(payload_len as u64, Ordering::Relaxed);
    }

    pub fn increment_num_receive_failed(&self) {
        self.num_receive_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_flow_permits(&self, permits: u32) {
        self.num_flow_permits_sent
            .fetch_add(u64::from(permits), Ordering::Relaxed);
    }

    pub(crate) fn increment_stale_discarded(&self) {
        self.num_stale_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_listener_failures(&self) {
        self.num_listener_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_reconnects(&self) {
        self.num_reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ConsumerStatsSnapshot {
        ConsumerStatsSnapshot {
            num_msgs_received: self.num_msgs_received.load(Ordering::Relaxed),
            num_bytes_received: self.num_bytes_received.load(Ordering::Relaxed),
            num_receive_failed: self.num_receive_failed.load(Ordering::Relaxed),
            num_flow_permits_sent: self.num_flow_permits_sent.load(Ordering::Relaxed),
            num_stale_discarded: self.num_stale_discarded.load(Ordering::Relaxed),
            num_listener_failures: self.num_listener_failures.load(Ordering::Relaxed),
            num_reconnects: self.num_reconnects.load(Ordering::Relaxed),
        }
    }
}

/// Read-only copy of a consumer's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerStatsSnapshot {
    pub num_msgs_received: u64,
    pub num_bytes_received: u64,
    pub num_receive_failed: u64,
    /// Total permits granted to the broker across all connections.
    pub num_flow_permits_sent: u64,
    /// Messages dropped because they arrived on a superseded connection.
    pub num_stale_discarded: u64,
    pub num_listener_failures: u64,
    pub num_reconnects: u64,
}
