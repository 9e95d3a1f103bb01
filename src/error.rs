//! Error types for zeroq-link.

use thiserror::Error;

/// Result type for consumer operations.
pub type Result<T> = std::result::Result<T, ConsumerError>;

/// The broker sent something a zero-queue consumer cannot accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// A batched message arrived; batching would deliver more than one
    /// logical message per flow credit.
    #[error(
        "Unsupported batch message with zero receiver queue size for [{subscription}]-[{consumer_name}]"
    )]
    BatchingNotSupported {
        subscription: String,
        consumer_name: String,
    },
}

/// Errors surfaced by the zero-queue consumer.
#[derive(Debug, Clone, Error)]
pub enum ConsumerError {
    /// The consumer (or its client) is shutting down.
    #[error("Consumer already closed")]
    ClientClosed,

    /// A pending receive was abandoned before a message was delivered.
    #[error("Receive interrupted")]
    Interrupted,

    #[error("Protocol violation: {0}")]
    ProtocolViolation(#[from] ProtocolViolation),

    /// Transport failure reported by the connection layer.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Malformed or missing configuration values.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The operation is not allowed for this consumer's delivery mode.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ConsumerError {
    /// Returns `true` for errors that a reconnect may resolve.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConsumerError::ConnectionError(_))
    }

    /// Returns `true` if this is the batching protocol violation.
    pub fn is_batching_not_supported(&self) -> bool {
        matches!(
            self,
            ConsumerError::ProtocolViolation(ProtocolViolation::BatchingNotSupported { .. })
        )
    }
}
