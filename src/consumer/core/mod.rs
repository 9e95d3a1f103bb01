mod builder;
mod listener;
mod reconnect;
mod receive_future;
mod state;
mod zero_queue;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::ConsumerBuilder;
pub use reconnect::ConnectionHandler;
pub use receive_future::ReceiveFuture;
pub use zero_queue::ZeroQueueConsumer;
