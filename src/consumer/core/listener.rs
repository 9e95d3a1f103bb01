//! Single-worker listener dispatch.
//!
//! Messages admitted in listener mode are handed to one background task that
//! calls the listener sequentially, preserving arrival order. The task keeps
//! only a weak reference to the consumer so dropping every handle stops it.

use super::zero_queue::{ConsumerInner, ZeroQueueConsumer};
use crate::{consumer::models::MessageListener, models::Message};
use log::debug;
use std::sync::{Mutex, PoisonError, Weak};
use tokio::sync::mpsc;

pub(crate) struct ListenerDispatcher {
    tx: Mutex<Option<mpsc::UnboundedSender<Message>>>,
}

impl ListenerDispatcher {
    /// Start the worker. Must be called inside a tokio runtime.
    pub fn spawn(consumer: Weak<ConsumerInner>, listener: MessageListener) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(listener_loop(consumer, listener, rx));
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }

    /// Queue `message` for the worker. Returns `false` once the worker is gone.
    pub fn dispatch(&self, message: Message) -> bool {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        match tx.as_ref() {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Stop accepting messages; the worker exits after its current call.
    pub fn close(&self) {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

async fn listener_loop(
    consumer: Weak<ConsumerInner>,
    listener: MessageListener,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(message) = rx.recv().await {
        let Some(inner) = consumer.upgrade() else {
            break;
        };
        let consumer = ZeroQueueConsumer::from_inner(inner);
        if consumer.is_closed() {
            debug!(
                "[{}][{}] Skipping listener call for {}: consumer closed",
                consumer.topic(),
                consumer.subscription(),
                message.id()
            );
            consumer.listener_skipped();
            continue;
        }
        consumer.deliver_to_listener(&listener, message).await;
    }
    debug!("Listener worker stopped");
}
