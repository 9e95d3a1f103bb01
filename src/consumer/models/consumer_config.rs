use std::{collections::HashMap, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{ConsumerError, Result};

/// Configuration for a [`ZeroQueueConsumer`](crate::ZeroQueueConsumer).
///
/// # Example
///
/// ```rust
/// use zeroq_link::ConsumerConfig;
///
/// let config = ConsumerConfig::new("persistent://public/default/orders", "billing")
///     .with_consumer_name("billing-1")
///     .with_backoff_ms(200, 10_000)
///     .with_max_reconnect_attempts(Some(5));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    pub topic: String,

    pub subscription_name: String,

    /// Empty means "derive from subscription and consumer id".
    #[serde(default)]
    pub consumer_name: String,

    /// Broker-side consumer id used in flow, ack and close commands.
    #[serde(default)]
    pub consumer_id: u64,

    /// Must be zero; a non-zero queue needs the prefetching consumer.
    #[serde(default)]
    pub receiver_queue_size: u32,

    /// Reconnect automatically when the connection is lost.
    /// Default: true
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,

    /// First reconnect delay; doubles per failed attempt.
    /// Default: 100ms
    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,

    /// Ceiling for the reconnect delay.
    /// Default: 30000ms
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Give up after this many failed attempts. `None` retries forever.
    #[serde(default)]
    pub max_reconnect_attempts: Option<u32>,
}

fn default_auto_reconnect() -> bool {
    true
}

fn default_backoff_initial_ms() -> u64 {
    100
}

fn default_backoff_max_ms() -> u64 {
    30_000
}

impl ConsumerConfig {
    pub fn new(topic: impl Into<String>, subscription_name: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            subscription_name: subscription_name.into(),
            consumer_name: String::new(),
            consumer_id: 0,
            receiver_queue_size: 0,
            auto_reconnect: default_auto_reconnect(),
            backoff_initial_ms: default_backoff_initial_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            max_reconnect_attempts: None,
        }
    }

    pub fn with_consumer_name(mut self, name: impl Into<String>) -> Self {
        self.consumer_name = name.into();
        self
    }

    pub fn with_consumer_id(mut self, consumer_id: u64) -> Self {
        self.consumer_id = consumer_id;
        self
    }

    pub fn with_auto_reconnect(mut self, auto_reconnect: bool) -> Self {
        self.auto_reconnect = auto_reconnect;
        self
    }

    pub fn with_backoff_ms(mut self, initial_ms: u64, max_ms: u64) -> Self {
        self.backoff_initial_ms = initial_ms;
        self.backoff_max_ms = max_ms;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    pub fn backoff_initial(&self) -> Duration {
        Duration::from_millis(self.backoff_initial_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    /// Consumer name used in logs and protocol errors.
    pub fn effective_consumer_name(&self) -> String {
        if self.consumer_name.is_empty() {
            format!("{}-{}", self.subscription_name, self.consumer_id)
        } else {
            self.consumer_name.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(ConsumerError::ConfigurationError("topic is required".into()));
        }
        if self.subscription_name.trim().is_empty() {
            return Err(ConsumerError::ConfigurationError(
                "subscription_name is required".into(),
            ));
        }
        if self.receiver_queue_size != 0 {
            return Err(ConsumerError::ConfigurationError(format!(
                "zero-queue consumer requires receiver_queue_size 0, got {}",
                self.receiver_queue_size
            )));
        }
        if self.backoff_initial_ms == 0 {
            return Err(ConsumerError::ConfigurationError(
                "backoff_initial_ms must be greater than 0".into(),
            ));
        }
        if self.backoff_max_ms < self.backoff_initial_ms {
            return Err(ConsumerError::ConfigurationError(format!(
                "backoff_max_ms ({}) must not be below backoff_initial_ms ({})",
                self.backoff_max_ms, self.backoff_initial_ms
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            ConsumerError::ConfigurationError(format!("Invalid consumer config JSON: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        let topic = get_str(map, "topic", "topic")
            .ok_or_else(|| ConsumerError::ConfigurationError("topic is required".into()))?;
        let subscription = get_str(map, "subscription_name", "subscription.name").ok_or_else(
            || ConsumerError::ConfigurationError("subscription_name is required".into()),
        )?;

        let mut config = Self::new(topic, subscription);

        if let Some(value) = get_str(map, "consumer_name", "consumer.name") {
            config.consumer_name = value;
        }
        if let Some(value) = get_str(map, "consumer_id", "consumer.id") {
            config.consumer_id = parse_u64(&value, "consumer_id")?;
        }
        if let Some(value) = get_str(map, "receiver_queue_size", "receiver.queue.size") {
            config.receiver_queue_size = parse_u32(&value, "receiver_queue_size")?;
        }
        if let Some(value) = get_str(map, "auto_reconnect", "auto.reconnect") {
            config.auto_reconnect = parse_bool(&value)?;
        }
        if let Some(value) = get_str(map, "backoff_initial_ms", "backoff.initial.ms") {
            config.backoff_initial_ms = parse_u64(&value, "backoff_initial_ms")?;
        }
        if let Some(value) = get_str(map, "backoff_max_ms", "backoff.max.ms") {
            config.backoff_max_ms = parse_u64(&value, "backoff_max_ms")?;
        }
        if let Some(value) = get_str(map, "max_reconnect_attempts", "max.reconnect.attempts") {
            config.max_reconnect_attempts = Some(parse_u32(&value, "max_reconnect_attempts")?);
        }

        config.validate()?;
        Ok(config)
    }
}

fn get_str(map: &HashMap<String, String>, key: &str, alias: &str) -> Option<String> {
    map.get(key).cloned().or_else(|| map.get(alias).cloned())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(ConsumerError::ConfigurationError(format!("Invalid boolean value: {}", value))),
    }
}

fn parse_u32(value: &str, field: &str) -> Result<u32> {
    value.parse::<u32>().map_err(|_| {
        ConsumerError::ConfigurationError(format!("Invalid {} value: {}", field, value))
    })
}

fn parse_u64(value: &str, field: &str) -> Result<u64> {
    value.parse::<u64>().map_err(|_| {
        ConsumerError::ConfigurationError(format!("Invalid {} value: {}", field, value))
    })
}
