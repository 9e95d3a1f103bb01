//! Transport seam between the consumer and a broker connection.
//!
//! The consumer never owns sockets. A transport implements [`Connection`]
//! for each established link to a broker partition and hands inbound
//! messages to the consumer tagged with that link's [`ConnectionId`]. The id
//! is the connection epoch: a message is only accepted if its id matches the
//! connection the consumer considers current.

mod backoff;

pub use backoff::Backoff;

use crate::{error::Result, models::MessageId};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one transport connection (the connection epoch).
///
/// Ids are process-unique and never reused, so a message that was in flight
/// on a superseded connection can always be told apart from one on the
/// current connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate a fresh, never-before-used connection id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cnx-{}", self.0)
    }
}

/// A live transport to a broker partition.
///
/// `id`, `is_connected` and `send_flow_permits` are called while the
/// consumer holds its connection-state lock, so implementations must not
/// block and must not call back into the consumer from them. Writes are
/// expected to be queued onto the transport.
pub trait Connection: Send + Sync {
    /// Epoch identity of this connection.
    fn id(&self) -> ConnectionId;

    /// Whether the transport is still open.
    fn is_connected(&self) -> bool;

    /// Send a flow command granting `permits` more messages to `consumer_id`.
    fn send_flow_permits(&self, consumer_id: u64, permits: u32) -> Result<()>;

    /// Acknowledge a message.
    fn send_ack(&self, consumer_id: u64, message_id: &MessageId) -> Result<()>;

    /// Tell the broker the consumer is going away.
    fn close_consumer(&self, consumer_id: u64) -> Result<()>;
}

/// Factory for new connections, driven by
/// [`ConnectionHandler`](crate::consumer::ConnectionHandler) during reconnects.
pub trait Connector: Send + Sync {
    fn connect(&self) -> BoxFuture<'_, Result<Arc<dyn Connection>>>;
}
