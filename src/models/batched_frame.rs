//! Batched entry as received from the broker.

use crate::{connection::ConnectionId, models::MessageId};
use bytes::Bytes;

/// An entry that packs several logical messages.
///
/// A zero-queue consumer rejects these outright; the payload is carried only
/// so transports can hand the frame over without decoding it.
#[derive(Debug, Clone)]
pub struct BatchedFrame {
    pub message_id: MessageId,
    /// Number of logical messages in the batch.
    pub num_messages: u32,
    pub redelivery_count: u32,
    /// Still-encoded batch payload.
    pub payload: Bytes,
    pub connection: ConnectionId,
}

impl BatchedFrame {
    pub fn new(message_id: MessageId, num_messages: u32, connection: ConnectionId) -> Self {
        Self {
            message_id,
            num_messages,
            redelivery_count: 0,
            payload: Bytes::new(),
            connection,
        }
    }
}
