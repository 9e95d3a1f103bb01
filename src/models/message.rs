//! A single message delivered to the consumer.

use crate::{connection::ConnectionId, models::MessageId};
use bytes::Bytes;
use std::collections::HashMap;

/// A message as handed over by the transport.
///
/// Every message remembers the connection that delivered it; the consumer
/// uses that to discard messages that were in flight on a superseded
/// connection.
#[derive(Debug, Clone)]
pub struct Message {
    id: MessageId,
    payload: Bytes,
    connection: ConnectionId,
    key: Option<String>,
    redelivery_count: u32,
    publish_time_ms: u64,
    properties: HashMap<String, String>,
}

impl Message {
    pub fn new(id: MessageId, payload: impl Into<Bytes>, connection: ConnectionId) -> Self {
        Self {
            id,
            payload: payload.into(),
            connection,
            key: None,
            redelivery_count: 0,
            publish_time_ms: 0,
            properties: HashMap::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_redelivery_count(mut self, count: u32) -> Self {
        self.redelivery_count = count;
        self
    }

    pub fn with_publish_time_ms(mut self, publish_time_ms: u64) -> Self {
        self.publish_time_ms = publish_time_ms;
        self
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Connection (epoch) this message arrived on.
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn redelivery_count(&self) -> u32 {
        self.redelivery_count
    }

    pub fn publish_time_ms(&self) -> u64 {
        self.publish_time_ms
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }
}
