//! Connection-scoped state of a zero-queue consumer.
//!
//! Everything the receive path, the transport callbacks and the reconnect
//! hook share lives in [`ConnectionState`], behind one mutex owned by the
//! consumer. Methods are whole operations so each critical section is a
//! single call; none of them block or await.

use crate::{
    connection::{Connection, ConnectionId},
    error::{ConsumerError, Result},
    models::{Message, MessageId},
};
use std::{collections::VecDeque, sync::Arc};
use tokio::sync::oneshot;

pub(crate) type PendingReceive = oneshot::Sender<Result<Message>>;

/// Outcome of checking the head of the handoff buffer.
pub(crate) enum Acceptance {
    /// Delivered on the current connection; the fetch is complete.
    Accepted(Message),
    /// Delivered on a superseded connection; must be discarded.
    Stale(Message),
    Empty,
}

/// Outcome of handing an inbound message to the pull path.
pub(crate) enum Delivery {
    /// Completed a pending `receive_async` future.
    Completed {
        message_id: MessageId,
        payload_len: usize,
    },
    /// Parked in the handoff buffer for `receive()`.
    Buffered { depth: usize },
    /// Arrived on a superseded connection while async receives were pending.
    Stale(Message),
    /// The consumer is closed.
    Dropped,
}

/// What `close()` has to finish once the lock is released.
pub(crate) struct Teardown {
    pub pending: Vec<PendingReceive>,
    pub connection: Option<Arc<dyn Connection>>,
    pub error: ConsumerError,
}

#[derive(Default)]
pub(crate) struct ConnectionState {
    current: Option<Arc<dyn Connection>>,
    /// Set while a blocking fetch has asked for a message and not received it.
    awaiting_zero_queue_message: bool,
    /// Handoff buffer; holds at most one message in normal operation.
    incoming: VecDeque<Message>,
    pending_receives: VecDeque<PendingReceive>,
    /// Messages handed to the listener worker whose callback has not returned.
    listener_in_flight: usize,
    closed: bool,
    failure: Option<ConsumerError>,
    last_dequeued: Option<MessageId>,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cnx(&self) -> Option<Arc<dyn Connection>> {
        self.current.clone()
    }

    pub fn current_id(&self) -> Option<ConnectionId> {
        self.current.as_ref().map(|cnx| cnx.id())
    }

    pub fn is_connected(&self) -> bool {
        self.current.as_ref().map_or(false, |cnx| cnx.is_connected())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn last_dequeued(&self) -> Option<MessageId> {
        self.last_dequeued
    }

    pub fn buffered(&self) -> usize {
        self.incoming.len()
    }

    /// Whether a receive (blocking or async) is waiting for a message.
    pub fn awaiting_message(&self) -> bool {
        self.awaiting_zero_queue_message
            || self.pending_receives.iter().any(|tx| !tx.is_closed())
    }

    /// Error every receive must fail with, once the consumer is closing.
    pub fn terminal_error(&self) -> Option<ConsumerError> {
        match (&self.failure, self.closed) {
            (Some(failure), _) => Some(failure.clone()),
            (None, true) => Some(ConsumerError::ClientClosed),
            (None, false) => None,
        }
    }

    /// Connection a flow credit should go to right now, if any.
    ///
    /// `None` means the credit is deferred: the reconnect hook grants it on
    /// the next connection because the waiting flag is still set.
    pub fn request_credit_if_needed(&self) -> Option<Arc<dyn Connection>> {
        match &self.current {
            Some(cnx) if cnx.is_connected() && self.terminal_error().is_none() => {
                Some(Arc::clone(cnx))
            },
            _ => None,
        }
    }

    /// Start a blocking fetch: empty the buffer and raise the waiting flag.
    ///
    /// Returns how many leftover messages were dropped; anything non-zero
    /// means an earlier race left the buffer dirty.
    pub fn begin_fetch(&mut self) -> usize {
        let dropped = self.incoming.len();
        self.incoming.clear();
        self.awaiting_zero_queue_message = true;
        dropped
    }

    /// Pop the head of the buffer and check it against the current epoch.
    pub fn accept_if_current_epoch(&mut self) -> Acceptance {
        let Some(message) = self.incoming.pop_front() else {
            return Acceptance::Empty;
        };
        if Some(message.connection()) != self.current_id() {
            return Acceptance::Stale(message);
        }
        self.awaiting_zero_queue_message = false;
        self.last_dequeued = Some(message.id());
        self.incoming.clear();
        Acceptance::Accepted(message)
    }

    /// Undo a fetch that ended without a message.
    pub fn abandon_fetch(&mut self) {
        self.awaiting_zero_queue_message = false;
        self.incoming.clear();
    }

    /// Take an already-buffered message of the current epoch for an async
    /// receive. Returns the message (if any) and how many stale ones were
    /// dropped on the way.
    pub fn take_buffered_current(&mut self) -> (Option<Message>, usize) {
        let current = self.current_id();
        let mut stale = 0;
        while let Some(message) = self.incoming.pop_front() {
            if Some(message.connection()) == current {
                self.last_dequeued = Some(message.id());
                return (Some(message), stale);
            }
            stale += 1;
        }
        (None, stale)
    }

    pub fn register_pending(&mut self, tx: PendingReceive) {
        self.pending_receives.retain(|pending| !pending.is_closed());
        self.pending_receives.push_back(tx);
    }

    /// Route an accepted inbound message to a pending async receive, or
    /// park it in the handoff buffer.
    pub fn deliver(&mut self, message: Message) -> Delivery {
        if self.closed {
            return Delivery::Dropped;
        }
        let mut message = message;
        if !self.pending_receives.is_empty() {
            if Some(message.connection()) != self.current_id() {
                return Delivery::Stale(message);
            }
            while let Some(tx) = self.pending_receives.pop_front() {
                let message_id = message.id();
                let payload_len = message.payload().len();
                match tx.send(Ok(message)) {
                    Ok(()) => {
                        self.last_dequeued = Some(message_id);
                        return Delivery::Completed {
                            message_id,
                            payload_len,
                        };
                    },
                    // Receiver dropped; try the next pending receive.
                    Err(Ok(returned)) => message = returned,
                    Err(Err(_)) => return Delivery::Dropped,
                }
            }
        }
        self.incoming.push_back(message);
        Delivery::Buffered {
            depth: self.incoming.len(),
        }
    }

    /// Install the connection produced by a reconnect.
    pub fn install_connection(&mut self, cnx: Arc<dyn Connection>) -> Option<ConnectionId> {
        let previous = self.current_id();
        self.current = Some(cnx);
        previous
    }

    /// Forget the current connection if it is `connection`.
    ///
    /// Close notifications for an already-replaced connection are ignored.
    pub fn clear_connection(&mut self, connection: ConnectionId) -> bool {
        if self.current_id() == Some(connection) {
            self.current = None;
            true
        } else {
            false
        }
    }

    /// Whether a freshly installed connection needs a flow credit.
    ///
    /// Nothing is banked ahead of time in zero-queue mode, so without this
    /// credit the pipeline would stall after a reconnect. A listener whose
    /// callback is still running is left alone: it replenishes on return.
    pub fn needs_credit_after_reconnect(
        &mut self,
        previous_queue_size: usize,
        has_listener: bool,
    ) -> bool {
        self.pending_receives.retain(|tx| !tx.is_closed());
        self.awaiting_message()
            || !self.incoming.is_empty()
            || previous_queue_size > 0
            || (has_listener && self.listener_in_flight == 0)
    }

    /// Hand a message to the listener if it arrived on the current
    /// connection. A stale message is refused so its replenishment can not
    /// put a second credit on the new connection.
    pub fn admit_to_listener(&mut self, connection: ConnectionId) -> bool {
        if Some(connection) != self.current_id() {
            return false;
        }
        self.listener_in_flight += 1;
        true
    }

    #[cfg(test)]
    pub fn listener_in_flight(&self) -> usize {
        self.listener_in_flight
    }

    pub fn listener_finished(&mut self) {
        self.listener_in_flight = self.listener_in_flight.saturating_sub(1);
    }

    /// Record a fatal protocol failure and hand back every pending receive
    /// so it can be failed outside the lock.
    pub fn fail(&mut self, error: ConsumerError) -> Vec<PendingReceive> {
        if self.failure.is_none() {
            self.failure = Some(error);
        }
        self.incoming.clear();
        self.pending_receives.drain(..).collect()
    }

    /// Mark the consumer closed. Returns `None` if it already was.
    pub fn close(&mut self) -> Option<Teardown> {
        if self.closed {
            return None;
        }
        self.closed = true;
        self.awaiting_zero_queue_message = false;
        self.incoming.clear();
        let error = self.terminal_error().unwrap_or(ConsumerError::ClientClosed);
        Some(Teardown {
            pending: self.pending_receives.drain(..).collect(),
            connection: self.current.take(),
            error,
        })
    }
}
