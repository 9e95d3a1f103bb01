use super::zero_queue::ZeroQueueConsumer;
use crate::{
    consumer::models::{ConsumerConfig, ListenerError, MessageListener},
    error::Result,
    event_handlers::EventHandlers,
    models::Message,
};
use std::sync::Arc;

/// Builder for configuring [`ZeroQueueConsumer`] instances.
pub struct ConsumerBuilder {
    config: ConsumerConfig,
    listener: Option<MessageListener>,
    event_handlers: EventHandlers,
}

impl ConsumerBuilder {
    pub(crate) fn new(config: ConsumerConfig) -> Self {
        Self {
            config,
            listener: None,
            event_handlers: EventHandlers::default(),
        }
    }

    /// Deliver messages to `listener` instead of `receive()`.
    ///
    /// The listener runs on a blocking worker, one message at a time; the
    /// next permit is granted only after it returns.
    pub fn listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&ZeroQueueConsumer, Message) -> std::result::Result<(), ListenerError>
            + Send
            + Sync
            + 'static,
    {
        self.listener = Some(Arc::new(listener));
        self
    }

    pub fn message_listener(mut self, listener: MessageListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Set lifecycle event handlers (connect, disconnect, error, flow, close).
    pub fn event_handlers(mut self, handlers: EventHandlers) -> Self {
        self.event_handlers = handlers;
        self
    }

    /// Validate the configuration and build the consumer.
    ///
    /// Building with a listener must happen inside a tokio runtime.
    pub fn build(self) -> Result<ZeroQueueConsumer> {
        ZeroQueueConsumer::new(self.config, self.listener, self.event_handlers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{consumer::models::DeliveryMode, error::ConsumerError};

    #[test]
    fn test_builder_defaults_to_pull() {
        let consumer = ConsumerBuilder::new(ConsumerConfig::new("orders", "billing"))
            .build()
            .unwrap();
        assert_eq!(consumer.delivery_mode(), DeliveryMode::Pull);
        assert_eq!(consumer.consumer_name(), "billing-0");
        assert!(!consumer.is_connected());
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let mut config = ConsumerConfig::new("orders", "billing");
        config.receiver_queue_size = 10;
        let err = ConsumerBuilder::new(config).build().unwrap_err();
        assert!(matches!(err, ConsumerError::ConfigurationError(_)));
    }

    #[tokio::test]
    async fn test_builder_with_listener() {
        let consumer = ConsumerBuilder::new(ConsumerConfig::new("orders", "billing"))
            .listener(|_, _| Ok(()))
            .build()
            .unwrap();
        assert_eq!(consumer.delivery_mode(), DeliveryMode::Listener);
        assert!(consumer.has_listener());
    }
}
