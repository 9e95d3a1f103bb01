//! In-memory connection used by unit tests.

use crate::{
    connection::{Connection, ConnectionId},
    error::{ConsumerError, Result},
    models::{Message, MessageId},
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

pub(crate) struct MockConnection {
    id: ConnectionId,
    connected: AtomicBool,
    fail_flow: AtomicBool,
    flows: Mutex<Vec<u32>>,
    acks: Mutex<Vec<MessageId>>,
    closed_consumers: Mutex<Vec<u64>>,
}

impl MockConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::next(),
            connected: AtomicBool::new(true),
            fail_flow: AtomicBool::new(false),
            flows: Mutex::new(Vec::new()),
            acks: Mutex::new(Vec::new()),
            closed_consumers: Mutex::new(Vec::new()),
        })
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn set_fail_flow(&self, fail: bool) {
        self.fail_flow.store(fail, Ordering::SeqCst);
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

    pub fn closed_consumers(&self) -> Vec<u64> {
        self.closed_consumers.lock().unwrap().clone()
    }

    pub fn message(&self, entry_id: u64) -> Message {
        Message::new(MessageId::new(1, entry_id), format!("msg-{}", entry_id), self.id)
    }

    /// Wait until at least `permits` permits were granted on this connection.
    pub async fn wait_for_permits(&self, permits: u32) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.permits() < permits {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for flow permits");
    }
}

impl Connection for MockConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn send_flow_permits(&self, _consumer_id: u64, permits: u32) -> Result<()> {
        if self.fail_flow.load(Ordering::SeqCst) {
            return Err(ConsumerError::ConnectionError("flow write failed".into()));
        }
        self.flows.lock().unwrap().push(permits);
        Ok(())
    }

    fn send_ack(&self, _consumer_id: u64, message_id: &MessageId) -> Result<()> {
        self.acks.lock().unwrap().push(*message_id);
        Ok(())
    }

    fn close_consumer(&self, consumer_id: u64) -> Result<()> {
        self.closed_consumers.lock().unwrap().push(consumer_id);
        Ok(())
    }
}
