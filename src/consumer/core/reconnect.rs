//! Reconnect coordination for a [`ZeroQueueConsumer`].
//!
//! [`ConnectionHandler`] obtains connections from a [`Connector`], retrying
//! with exponential backoff, and installs each one through
//! [`ZeroQueueConsumer::on_reconnect`], which regrants the single flow credit
//! a waiting receive needs.

use super::zero_queue::ZeroQueueConsumer;
use crate::{
    connection::{Backoff, ConnectionId, Connector},
    error::{ConsumerError, Result},
    event_handlers::{DisconnectReason, ErrorEvent},
};
use log::{debug, info, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};
use tokio::task::JoinHandle;

pub struct ConnectionHandler {
    consumer: ZeroQueueConsumer,
    connector: Arc<dyn Connector>,
    backoff: Mutex<Backoff>,
    reconnecting: AtomicBool,
}

impl ConnectionHandler {
    pub fn new(consumer: ZeroQueueConsumer, connector: Arc<dyn Connector>) -> Arc<Self> {
        let config = consumer.config();
        let backoff = Backoff::new(config.backoff_initial(), config.backoff_max());
        Arc::new(Self {
            consumer,
            connector,
            backoff: Mutex::new(backoff),
            reconnecting: AtomicBool::new(false),
        })
    }

    pub fn consumer(&self) -> &ZeroQueueConsumer {
        &self.consumer
    }

    /// Connect, retrying with backoff, and install the connection on the
    /// consumer.
    ///
    /// Fails with [`ConsumerError::ClientClosed`] if the consumer closes
    /// first, or with a connection error once `max_reconnect_attempts`
    /// consecutive attempts have failed.
    pub async fn grab_connection(&self) -> Result<ConnectionId> {
        let max_attempts = self.consumer.config().max_reconnect_attempts;
        loop {
            if self.consumer.is_closed() {
                return Err(ConsumerError::ClientClosed);
            }

            let err = match self.connector.connect().await {
                Ok(cnx) => {
                    let id = cnx.id();
                    self.consumer.on_reconnect(cnx, 0)?;
                    self.lock_backoff().reset();
                    return Ok(id);
                },
                Err(e) => e,
            };

            let (attempts, delay) = {
                let mut backoff = self.lock_backoff();
                let delay = backoff.next_delay();
                (backoff.attempts(), delay)
            };

            if let Some(max) = max_attempts {
                if attempts >= max {
                    warn!(
                        "[{}][{}] Max reconnection attempts ({}) reached: {}",
                        self.consumer.topic(),
                        self.consumer.subscription(),
                        max,
                        err
                    );
                    self.consumer.emit_error(ErrorEvent::new(
                        format!("Max reconnection attempts ({}) reached", max),
                        false,
                    ));
                    self.lock_backoff().reset();
                    return Err(ConsumerError::ConnectionError(format!(
                        "Max reconnection attempts ({}) reached: {}",
                        max, err
                    )));
                }
            }

            warn!(
                "[{}][{}] Connection attempt {} failed: {}; retrying in {}ms",
                self.consumer.topic(),
                self.consumer.subscription(),
                attempts,
                err,
                delay.as_millis()
            );
            self.consumer.emit_error(ErrorEvent::new(err.to_string(), true));

            tokio::select! {
                _ = tokio::time::sleep(delay) => {},
                _ = self.consumer.closed() => return Err(ConsumerError::ClientClosed),
            }
        }
    }

    /// The transport reports that `connection` went away.
    ///
    /// Marks the consumer disconnected and, with `auto_reconnect` on,
    /// spawns a reconnect. Returns the reconnect task, or `None` when
    /// `connection` was already superseded, the consumer is closed, or a
    /// reconnect is already running.
    pub fn connection_closed(
        self: &Arc<Self>,
        connection: ConnectionId,
        reason: DisconnectReason,
    ) -> Option<JoinHandle<()>> {
        if !self.consumer.connection_closed(connection, reason) {
            return None;
        }
        if !self.consumer.config().auto_reconnect || self.consumer.is_closed() {
            debug!(
                "[{}][{}] Not reconnecting after losing {}",
                self.consumer.topic(),
                self.consumer.subscription(),
                connection
            );
            return None;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                "[{}][{}] No tokio runtime available to reconnect",
                self.consumer.topic(),
                self.consumer.subscription()
            );
            return None;
        };
        if self.reconnecting.swap(true, Ordering::SeqCst) {
            return None;
        }

        let handler = Arc::clone(self);
        Some(runtime.spawn(async move {
            loop {
                let result = handler.grab_connection().await;
                match &result {
                    Ok(id) => info!(
                        "[{}][{}] Reconnected on {}",
                        handler.consumer.topic(),
                        handler.consumer.subscription(),
                        id
                    ),
                    Err(e) => warn!(
                        "[{}][{}] Giving up reconnect: {}",
                        handler.consumer.topic(),
                        handler.consumer.subscription(),
                        e
                    ),
                }
                handler.reconnecting.store(false, Ordering::SeqCst);

                // A close reported while the new connection was being
                // installed saw `reconnecting` set and scheduled nothing.
                if result.is_err()
                    || handler.consumer.is_closed()
                    || handler.consumer.cnx().is_some()
                    || handler.reconnecting.swap(true, Ordering::SeqCst)
                {
                    break;
                }
                debug!(
                    "[{}][{}] Connection lost during reconnect; retrying",
                    handler.consumer.topic(),
                    handler.consumer.subscription()
                );
            }
        }))
    }

    fn lock_backoff(&self) -> std::sync::MutexGuard<'_, Backoff> {
        self.backoff.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
