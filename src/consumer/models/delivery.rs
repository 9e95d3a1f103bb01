use std::sync::Arc;

use crate::{consumer::ZeroQueueConsumer, models::Message};

/// Error type a message listener may return; it is logged, never propagated.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Push-style message callback.
///
/// Invoked on the consumer's dedicated listener worker, one message at a
/// time, in arrival order. The callback may block; it runs on the blocking
/// thread pool.
pub type MessageListener =
    Arc<dyn Fn(&ZeroQueueConsumer, Message) -> Result<(), ListenerError> + Send + Sync>;

/// How messages reach the application. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// `receive()` / `receive_async()`.
    Pull,
    /// A message listener was configured.
    Listener,
}

/// Outcome of offering an inbound message to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Place the message in the handoff buffer.
    Accept,
    /// Do not buffer; the consumer already dispatched it.
    Reject,
}
