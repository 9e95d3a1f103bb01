//! # zeroq-link
//!
//! Zero-queue consumer for a pub/sub client.
//!
//! A zero-queue consumer never prefetches. Every receive grants exactly one
//! flow credit to the broker and waits for exactly one message, and that
//! message is only accepted if it arrived on the connection that is current
//! at acceptance time. Reconnects, batched messages and listener-driven
//! delivery are all coordinated through a single connection-state lock.
//!
//! ## Features
//!
//! - **Pull delivery**: [`ZeroQueueConsumer::receive`] and
//!   [`ZeroQueueConsumer::receive_async`]
//! - **Push delivery**: an ordered, single-worker message listener
//! - **Reconnect coordination**: [`ConnectionHandler`] with exponential backoff
//! - **Lifecycle hooks**: [`EventHandlers`] for connect, disconnect, flow and errors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use zeroq_link::{Connection, ConsumerConfig, ZeroQueueConsumer};
//!
//! # async fn example(cnx: Arc<dyn Connection>) -> zeroq_link::Result<()> {
//! let consumer = ZeroQueueConsumer::builder(ConsumerConfig::new("orders", "billing"))
//!     .build()?;
//!
//! // The transport installs the connection once it is established.
//! consumer.on_reconnect(cnx, 0)?;
//!
//! let message = consumer.receive().await?;
//! consumer.acknowledge(&message.id())?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod consumer;
pub mod error;
pub mod event_handlers;
pub mod models;
pub mod stats;

pub use connection::{Backoff, Connection, ConnectionId, Connector};
pub use consumer::{
    Admission, ConnectionHandler, ConsumerBuilder, ConsumerConfig, DeliveryMode, ListenerError,
    MessageListener, ReceiveFuture, ZeroQueueConsumer,
};
pub use error::{ConsumerError, ProtocolViolation, Result};
pub use event_handlers::{DisconnectReason, ErrorEvent, EventHandlers, FlowEvent};
pub use models::{BatchedFrame, Message, MessageId};
pub use stats::{ConsumerStats, ConsumerStatsSnapshot};
