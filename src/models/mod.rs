//! Data models for zeroq-link.
//!
//! Defines the inbound message shapes a transport hands to the consumer.

pub mod batched_frame;
pub mod message;
pub mod message_id;

pub use batched_frame::BatchedFrame;
pub use message::Message;
pub use message_id::MessageId;
