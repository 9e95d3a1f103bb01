mod consumer_config;
mod delivery;

pub use consumer_config::ConsumerConfig;
pub use delivery::{Admission, DeliveryMode, ListenerError, MessageListener};
