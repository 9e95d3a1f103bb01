//! Shared helpers for zero-queue consumer integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zeroq_link::{
    Connection, ConnectionId, ConsumerConfig, ConsumerError, Message, MessageId, Result,
    ZeroQueueConsumer,
};

/// In-memory connection that records every command sent on it.
pub struct RecordingConnection {
    id: ConnectionId,
    connected: AtomicBool,
    flows: Mutex<Vec<u32>>,
    acks: Mutex<Vec<MessageId>>,
    closed: AtomicBool,
}

impl RecordingConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::next(),
            connected: AtomicBool::new(true),
            flows: Mutex::new(Vec::new()),
            acks: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn drop_link(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn flows(&self) -> Vec<u32> {
        self.flows.lock().unwrap().clone()
    }

    pub fn permits(&self) -> u32 {
        self.flows().iter().sum()
    }

    pub fn acks(&self) -> Vec<MessageId> {
        self.acks.lock().unwrap().clone()
    }

    pub fn consumer_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn message(&self, entry_id: u64) -> Message {
        Message::new(
            MessageId::new(10, entry_id),
            format!("payload-{}", entry_id),
            self.id,
        )
    }

    pub async fn wait_for_permits(&self, permits: u32) {
        let reached = tokio::time::timeout(Duration::from_secs(5), async {
            while self.permits() < permits {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(
            reached.is_ok(),
            "expected {} permit(s) on {}, saw {:?}",
            permits,
            self.id,
            self.flows()
        );
    }
}

impl Connection for RecordingConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn send_flow_permits(&self, _consumer_id: u64, permits: u32) -> Result<()> {
        if !self.is_connected() {
            return Err(ConsumerError::ConnectionError("link is down".into()));
        }
        self.flows.lock().unwrap().push(permits);
        Ok(())
    }

    fn send_ack(&self, _consumer_id: u64, message_id: &MessageId) -> Result<()> {
        self.acks.lock().unwrap().push(*message_id);
        Ok(())
    }

    fn close_consumer(&self, _consumer_id: u64) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub fn pull_consumer() -> ZeroQueueConsumer {
    ZeroQueueConsumer::builder(ConsumerConfig::new("persistent://public/default/orders", "billing"))
        .build()
        .expect("Failed to build consumer")
}

pub async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let reached = tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "timed out waiting for {}", what);
}
