//! Zero-queue topic consumer.

pub mod core;
pub mod models;

pub use self::core::{ConnectionHandler, ConsumerBuilder, ReceiveFuture, ZeroQueueConsumer};
pub use models::{Admission, ConsumerConfig, DeliveryMode, ListenerError, MessageListener};
