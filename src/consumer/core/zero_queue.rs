//! `ZeroQueueConsumer` – a consumer that never prefetches.
//!
//! Every receive grants the broker exactly one flow permit and waits for
//! exactly one message. A message is accepted only if it arrived on the
//! connection that is current at acceptance time; anything delivered on a
//! superseded connection is discarded and the wait continues, without a
//! second permit.
//!
//! The consumer is built from two pieces selected at construction:
//!
//! - an admission policy: buffer-and-wake for pull delivery, or
//!   dispatch-immediately when a message listener is configured
//! - a [`ConnectionState`] shared by the receive path, the transport
//!   callbacks and the reconnect hook, guarded by one mutex

use super::{
    builder::ConsumerBuilder,
    listener::ListenerDispatcher,
    receive_future::ReceiveFuture,
    state::{Acceptance, ConnectionState, Delivery},
};
use crate::{
    connection::{Connection, ConnectionId},
    consumer::models::{Admission, ConsumerConfig, DeliveryMode, MessageListener},
    error::{ConsumerError, ProtocolViolation, Result},
    event_handlers::{DisconnectReason, ErrorEvent, EventHandlers, FlowEvent},
    models::{BatchedFrame, Message, MessageId},
    stats::{ConsumerStats, ConsumerStatsSnapshot},
};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{oneshot, Notify};

pub(crate) enum AdmissionPolicy {
    BufferAndWake,
    DispatchImmediately(ListenerDispatcher),
}

/// Result of a flow grant, reported to event handlers once the state lock
/// has been released.
enum FlowOutcome {
    Sent(FlowEvent),
    Failed(ErrorEvent),
    Deferred,
}

pub(crate) struct ConsumerInner {
    config: ConsumerConfig,
    consumer_name: String,
    state: Mutex<ConnectionState>,
    /// Serializes concurrent `receive()` callers.
    receive_lock: tokio::sync::Mutex<()>,
    /// Woken when a message is buffered or the consumer starts closing.
    message_available: Notify,
    admission: AdmissionPolicy,
    stats: ConsumerStats,
    handlers: EventHandlers,
}

impl ConsumerInner {
    fn lock_state(&self) -> Result<MutexGuard<'_, ConnectionState>> {
        self.state.lock().map_err(|e| {
            ConsumerError::InternalError(format!("Connection state lock poisoned: {}", e))
        })
    }

    /// Send `permits` on `cnx`. Called with the state lock held.
    fn grant_flow(&self, cnx: &Arc<dyn Connection>, permits: u32) -> FlowOutcome {
        match cnx.send_flow_permits(self.config.consumer_id, permits) {
            Ok(()) => {
                self.stats.record_flow_permits(permits);
                debug!(
                    "[{}][{}] Sent {} flow permit(s) on {}",
                    self.config.topic,
                    self.config.subscription_name,
                    permits,
                    cnx.id()
                );
                FlowOutcome::Sent(FlowEvent {
                    connection: cnx.id(),
                    permits,
                })
            },
            Err(e) => {
                warn!(
                    "[{}][{}] Failed to send flow permit on {}: {}",
                    self.config.topic,
                    self.config.subscription_name,
                    cnx.id(),
                    e
                );
                FlowOutcome::Failed(ErrorEvent::new(
                    format!("Failed to send flow permit on {}: {}", cnx.id(), e),
                    true,
                ))
            },
        }
    }

    fn report_flow(&self, outcome: FlowOutcome) {
        match outcome {
            FlowOutcome::Sent(event) => self.handlers.emit_flow(event),
            FlowOutcome::Failed(event) => self.handlers.emit_error(event),
            FlowOutcome::Deferred => {},
        }
    }

    fn discard_stale(&self, message: &Message, current: Option<ConnectionId>) {
        warn!(
            "[{}][{}] Discarding message {} from superseded connection {} (current: {:?})",
            self.config.topic,
            self.config.subscription_name,
            message.id(),
            message.connection(),
            current
        );
        self.stats.increment_stale_discarded();
    }
}

/// Undoes a blocking fetch that did not end with a message, including when
/// the `receive()` future is dropped mid-wait.
struct FetchGuard<'a> {
    inner: &'a ConsumerInner,
    armed: bool,
}

impl<'a> FetchGuard<'a> {
    fn new(inner: &'a ConsumerInner) -> Self {
        Self { inner, armed: true }
    }

    fn complete(&mut self) {
        self.armed = false;
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .abandon_fetch();
        self.inner.stats.increment_num_receive_failed();
    }
}

/// A consumer with a receiver queue of size zero.
///
/// Cheap to clone; all clones share one consumer.
///
/// # Examples
///
/// ```rust,no_run
/// use zeroq_link::{ConsumerConfig, ZeroQueueConsumer};
///
/// # async fn example() -> zeroq_link::Result<()> {
/// let consumer = ZeroQueueConsumer::builder(ConsumerConfig::new("orders", "billing"))
///     .listener(|consumer, message| {
///         println!("{} got {}", consumer.consumer_name(), message.id());
///         Ok(())
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ZeroQueueConsumer {
    inner: Arc<ConsumerInner>,
}

impl std::fmt::Debug for ZeroQueueConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZeroQueueConsumer")
            .field("topic", &self.inner.config.topic)
            .field("subscription", &self.inner.config.subscription_name)
            .field("consumer_name", &self.inner.consumer_name)
            .field("delivery_mode", &self.delivery_mode())
            .finish()
    }
}

impl ZeroQueueConsumer {
    pub fn builder(config: ConsumerConfig) -> ConsumerBuilder {
        ConsumerBuilder::new(config)
    }

    pub(crate) fn new(
        config: ConsumerConfig,
        listener: Option<MessageListener>,
        handlers: EventHandlers,
    ) -> Result<Self> {
        config.validate()?;
        if listener.is_some() && tokio::runtime::Handle::try_current().is_err() {
            return Err(ConsumerError::ConfigurationError(
                "A message listener requires a running tokio runtime".into(),
            ));
        }
        let consumer_name = config.effective_consumer_name();

        let inner = Arc::new_cyclic(|weak| {
            let admission = match listener {
                Some(listener) => AdmissionPolicy::DispatchImmediately(
                    ListenerDispatcher::spawn(weak.clone(), listener),
                ),
                None => AdmissionPolicy::BufferAndWake,
            };
            ConsumerInner {
                config,
                consumer_name,
                state: Mutex::new(ConnectionState::new()),
                receive_lock: tokio::sync::Mutex::new(()),
                message_available: Notify::new(),
                admission,
                stats: ConsumerStats::new(),
                handlers,
            }
        });

        Ok(Self { inner })
    }

    pub(crate) fn from_inner(inner: Arc<ConsumerInner>) -> Self {
        Self { inner }
    }

    // ---------------------------------------------------------------
    // Receive path
    // ---------------------------------------------------------------

    /// Receive the next message, granting the broker one flow permit.
    ///
    /// Waits until a message delivered on the current connection arrives.
    /// If the consumer is disconnected the permit is sent by the next
    /// [`on_reconnect`](Self::on_reconnect). Fails with
    /// [`ConsumerError::ClientClosed`] when the consumer is closed while
    /// waiting, or with the protocol violation that closed it.
    ///
    /// Dropping the returned future abandons the fetch.
    pub async fn receive(&self) -> Result<Message> {
        self.ensure_pull_mode("receive()")?;
        let _serial = self.inner.receive_lock.lock().await;
        let mut fetch = FetchGuard::new(&self.inner);

        let outcome = {
            let mut state = self.inner.lock_state()?;
            if let Some(err) = state.terminal_error() {
                return Err(err);
            }
            let dropped = state.begin_fetch();
            if dropped > 0 {
                error!(
                    "[{}][{}] The incoming message queue should never hold messages when queue size is 0; dropped {}",
                    self.inner.config.topic, self.inner.config.subscription_name, dropped
                );
            }
            match state.request_credit_if_needed() {
                Some(cnx) => self.inner.grant_flow(&cnx, 1),
                None => {
                    debug!(
                        "[{}][{}] Not connected; the flow permit will be sent on reconnect",
                        self.inner.config.topic, self.inner.config.subscription_name
                    );
                    FlowOutcome::Deferred
                },
            }
        };
        self.inner.report_flow(outcome);

        loop {
            let notified = self.inner.message_available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.inner.lock_state()?;
                if let Some(err) = state.terminal_error() {
                    return Err(err);
                }
                match state.accept_if_current_epoch() {
                    Acceptance::Accepted(message) => {
                        drop(state);
                        fetch.complete();
                        self.inner.stats.update_num_msgs_received(&message);
                        return Ok(message);
                    },
                    Acceptance::Stale(message) => {
                        let current = state.current_id();
                        drop(state);
                        self.inner.discard_stale(&message, current);
                        continue;
                    },
                    Acceptance::Empty => {},
                }
            }

            notified.await;
        }
    }

    /// Request the next message without waiting.
    ///
    /// Completes immediately if a current-epoch message is already buffered;
    /// otherwise registers a pending receive and grants one flow permit.
    /// The future resolves to [`ConsumerError::Interrupted`] if the pending
    /// receive is discarded without a result.
    pub fn receive_async(&self) -> ReceiveFuture {
        if let Err(e) = self.ensure_pull_mode("receive_async()") {
            return ReceiveFuture::ready(Err(e));
        }
        let (tx, rx) = oneshot::channel();

        let (buffered, stale, current, outcome) = {
            let mut state = match self.inner.lock_state() {
                Ok(state) => state,
                Err(e) => return ReceiveFuture::ready(Err(e)),
            };
            if let Some(err) = state.terminal_error() {
                return ReceiveFuture::ready(Err(err));
            }
            let (buffered, stale) = state.take_buffered_current();
            let outcome = match buffered {
                Some(_) => FlowOutcome::Deferred,
                None => {
                    state.register_pending(tx);
                    match state.request_credit_if_needed() {
                        Some(cnx) => self.inner.grant_flow(&cnx, 1),
                        None => FlowOutcome::Deferred,
                    }
                },
            };
            (buffered, stale, state.current_id(), outcome)
        };

        if stale > 0 {
            warn!(
                "[{}][{}] Dropped {} buffered message(s) from a superseded connection (current: {:?})",
                self.inner.config.topic, self.inner.config.subscription_name, stale, current
            );
            for _ in 0..stale {
                self.inner.stats.increment_stale_discarded();
            }
        }
        self.inner.report_flow(outcome);

        match buffered {
            Some(message) => {
                self.inner.stats.update_num_msgs_received(&message);
                ReceiveFuture::ready(Ok(message))
            },
            None => ReceiveFuture::pending(rx),
        }
    }

    fn ensure_pull_mode(&self, operation: &str) -> Result<()> {
        match self.delivery_mode() {
            DeliveryMode::Pull => Ok(()),
            DeliveryMode::Listener => Err(ConsumerError::InvalidConfiguration(format!(
                "Cannot use {} when a message listener has been set",
                operation
            ))),
        }
    }

    // ---------------------------------------------------------------
    // Transport callbacks
    // ---------------------------------------------------------------

    /// Offer an inbound message before it is buffered.
    ///
    /// With a listener the message is dispatched to the listener worker
    /// right away and [`Admission::Reject`] is returned so it is never
    /// buffered; a message from a superseded connection is discarded
    /// instead of dispatched. Without a listener it is
    /// [`Admission::Accept`]ed.
    pub fn can_enqueue_message(&self, message: &Message) -> Admission {
        match &self.inner.admission {
            AdmissionPolicy::BufferAndWake => Admission::Accept,
            AdmissionPolicy::DispatchImmediately(dispatcher) => {
                self.trigger_zero_queue_listener(dispatcher, message.clone());
                Admission::Reject
            },
        }
    }

    fn trigger_zero_queue_listener(&self, dispatcher: &ListenerDispatcher, message: Message) {
        let message_id = message.id();
        let admitted = match self.inner.lock_state() {
            Ok(state) if state.is_closed() => return,
            Ok(mut state) => {
                if state.admit_to_listener(message.connection()) {
                    Ok(())
                } else {
                    Err(state.current_id())
                }
            },
            Err(e) => {
                error!(
                    "[{}][{}] Dropping message {} for listener: {}",
                    self.inner.config.topic, self.inner.config.subscription_name, message_id, e
                );
                return;
            },
        };
        if let Err(current) = admitted {
            self.inner.discard_stale(&message, current);
            return;
        }
        if !dispatcher.dispatch(message) {
            debug!(
                "[{}][{}] Listener worker stopped; dropping message {}",
                self.inner.config.topic, self.inner.config.subscription_name, message_id
            );
            if let Ok(mut state) = self.inner.lock_state() {
                state.listener_finished();
            }
        }
    }

    /// Batch-oriented listener trigger.
    ///
    /// A no-op: every message was already dispatched when it was admitted.
    pub fn trigger_listener(&self, _num_messages: usize) {}

    /// Entry point for a single (non-batched) message from the transport.
    pub fn message_received(&self, message: Message) {
        if self.is_closed() {
            debug!(
                "[{}][{}] Dropping message {} received after close",
                self.inner.config.topic,
                self.inner.config.subscription_name,
                message.id()
            );
            return;
        }
        if self.can_enqueue_message(&message) == Admission::Reject {
            return;
        }

        let (delivery, current) = match self.inner.lock_state() {
            Ok(mut state) => {
                let delivery = state.deliver(message);
                (delivery, state.current_id())
            },
            Err(e) => {
                error!(
                    "[{}][{}] Dropping inbound message: {}",
                    self.inner.config.topic, self.inner.config.subscription_name, e
                );
                return;
            },
        };

        match delivery {
            Delivery::Completed {
                message_id,
                payload_len,
            } => {
                self.inner.stats.record_received(payload_len);
                debug!(
                    "[{}][{}] Completed pending receive with message {}",
                    self.inner.config.topic, self.inner.config.subscription_name, message_id
                );
            },
            Delivery::Buffered { depth } => {
                if depth > 1 {
                    warn!(
                        "[{}][{}] Handoff buffer holds {} messages with queue size 0",
                        self.inner.config.topic, self.inner.config.subscription_name, depth
                    );
                }
                self.inner.message_available.notify_waiters();
            },
            Delivery::Stale(message) => self.inner.discard_stale(&message, current),
            Delivery::Dropped => {},
        }
    }

    /// Entry point for a batched entry from the transport.
    ///
    /// Batching breaks the one-permit-one-message contract, so the batch is
    /// never decoded: pending receives fail with
    /// [`ProtocolViolation::BatchingNotSupported`] and the consumer closes.
    pub fn batch_received(&self, batch: BatchedFrame) {
        warn!(
            "Closing consumer [{}]-[{}] due to unsupported received batch-message with zero receiver queue size ({} messages in {})",
            self.inner.config.subscription_name,
            self.inner.consumer_name,
            batch.num_messages,
            batch.message_id
        );
        let violation: ConsumerError = ProtocolViolation::BatchingNotSupported {
            subscription: self.inner.config.subscription_name.clone(),
            consumer_name: self.inner.consumer_name.clone(),
        }
        .into();

        let pending = match self.inner.lock_state() {
            Ok(mut state) => state.fail(violation.clone()),
            Err(e) => {
                error!(
                    "[{}][{}] Failed to record batching violation: {}",
                    self.inner.config.topic, self.inner.config.subscription_name, e
                );
                Vec::new()
            },
        };
        for tx in pending {
            let _ = tx.send(Err(violation.clone()));
        }
        self.inner.message_available.notify_waiters();
        self.inner
            .handlers
            .emit_error(ErrorEvent::new(violation.to_string(), false));

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let consumer = self.clone();
                handle.spawn(async move {
                    if let Err(e) = consumer.close().await {
                        warn!("Failed to close consumer after batching violation: {}", e);
                    }
                });
            },
            Err(_) => {
                if let Err(e) = self.shutdown() {
                    warn!("Failed to close consumer after batching violation: {}", e);
                }
            },
        }
    }

    /// Reconnection hook, called once a new connection is established.
    ///
    /// Installs `cnx` as the current connection and, because nothing is
    /// banked ahead of time in zero-queue mode, grants one permit on it if a
    /// receive is waiting, a message is buffered, `previous_queue_size` is
    /// non-zero, or a listener is idle.
    pub fn on_reconnect(&self, cnx: Arc<dyn Connection>, previous_queue_size: usize) -> Result<()> {
        let id = cnx.id();
        let outcome = {
            let mut state = self.inner.lock_state()?;
            if let Some(err) = state.terminal_error() {
                debug!(
                    "[{}][{}] Ignoring reconnect on {}: consumer is closing",
                    self.inner.config.topic, self.inner.config.subscription_name, id
                );
                return Err(err);
            }
            let previous = state.install_connection(Arc::clone(&cnx));
            info!(
                "[{}][{}] Consumer connected on {} (previous: {:?})",
                self.inner.config.topic, self.inner.config.subscription_name, id, previous
            );
            if state.needs_credit_after_reconnect(previous_queue_size, self.has_listener()) {
                self.inner.grant_flow(&cnx, 1)
            } else {
                FlowOutcome::Deferred
            }
        };

        self.inner.stats.increment_reconnects();
        self.inner.handlers.emit_connect(id);
        self.inner.report_flow(outcome);
        Ok(())
    }

    /// The transport lost `connection`.
    ///
    /// Returns `false` if `connection` was not current (already replaced),
    /// in which case nothing changes.
    pub fn connection_closed(&self, connection: ConnectionId, reason: DisconnectReason) -> bool {
        let cleared = match self.inner.lock_state() {
            Ok(mut state) => state.clear_connection(connection),
            Err(_) => false,
        };
        if cleared {
            info!(
                "[{}][{}] Connection {} closed: {}",
                self.inner.config.topic, self.inner.config.subscription_name, connection, reason
            );
            self.inner.handlers.emit_disconnect(reason);
        } else {
            debug!(
                "[{}][{}] Ignoring close of superseded connection {}",
                self.inner.config.topic, self.inner.config.subscription_name, connection
            );
        }
        cleared
    }

    // ---------------------------------------------------------------
    // Listener path
    // ---------------------------------------------------------------

    /// Run the listener for one message, then replenish one permit.
    pub(crate) async fn deliver_to_listener(&self, listener: &MessageListener, message: Message) {
        self.inner.stats.update_num_msgs_received(&message);
        let message_id = message.id();
        debug!(
            "[{}][{}] Calling message listener for unqueued message {}",
            self.inner.config.topic, self.inner.config.subscription_name, message_id
        );

        let handle = self.clone();
        let listener = Arc::clone(listener);
        match tokio::task::spawn_blocking(move || listener(&handle, message)).await {
            Ok(Ok(())) => {},
            Ok(Err(e)) => {
                error!(
                    "[{}][{}] Message listener error in processing unqueued message {}: {}",
                    self.inner.config.topic, self.inner.config.subscription_name, message_id, e
                );
                self.inner.stats.increment_listener_failures();
            },
            Err(e) => {
                error!(
                    "[{}][{}] Message listener panicked in processing unqueued message {}: {}",
                    self.inner.config.topic, self.inner.config.subscription_name, message_id, e
                );
                self.inner.stats.increment_listener_failures();
            },
        }

        self.increase_available_permits();
    }

    /// Release a message the worker dropped without calling the listener.
    pub(crate) fn listener_skipped(&self) {
        if let Ok(mut state) = self.inner.lock_state() {
            state.listener_finished();
        }
    }

    /// Replenish the single permit after a listener call returns.
    fn increase_available_permits(&self) {
        let outcome = match self.inner.lock_state() {
            Ok(mut state) => {
                state.listener_finished();
                match state.request_credit_if_needed() {
                    Some(cnx) => self.inner.grant_flow(&cnx, 1),
                    None => FlowOutcome::Deferred,
                }
            },
            Err(e) => {
                error!(
                    "[{}][{}] Cannot replenish flow permit: {}",
                    self.inner.config.topic, self.inner.config.subscription_name, e
                );
                return;
            },
        };
        self.inner.report_flow(outcome);
    }

    // ---------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------

    /// Acknowledge a message on the current connection.
    pub fn acknowledge(&self, message_id: &MessageId) -> Result<()> {
        let cnx = {
            let state = self.inner.lock_state()?;
            if let Some(err) = state.terminal_error() {
                return Err(err);
            }
            state.cnx().filter(|cnx| cnx.is_connected())
        };
        match cnx {
            Some(cnx) => cnx.send_ack(self.inner.config.consumer_id, message_id),
            None => Err(ConsumerError::ConnectionError(format!(
                "Cannot acknowledge {}: consumer is not connected",
                message_id
            ))),
        }
    }

    /// Close the consumer.
    ///
    /// Wakes a waiting [`receive`](Self::receive) and fails pending async
    /// receives with [`ConsumerError::ClientClosed`] (or the protocol
    /// violation that triggered the close). Safe to call multiple times and
    /// concurrently with an in-flight receive.
    pub async fn close(&self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&self) -> Result<()> {
        let teardown = match self.inner.lock_state()?.close() {
            Some(teardown) => teardown,
            None => return Ok(()),
        };

        for tx in teardown.pending {
            let _ = tx.send(Err(teardown.error.clone()));
        }
        self.inner.message_available.notify_waiters();

        if let AdmissionPolicy::DispatchImmediately(dispatcher) = &self.inner.admission {
            dispatcher.close();
        }
        if let Some(cnx) = teardown.connection {
            if let Err(e) = cnx.close_consumer(self.inner.config.consumer_id) {
                warn!(
                    "[{}][{}] Failed to send close-consumer on {}: {}",
                    self.inner.config.topic,
                    self.inner.config.subscription_name,
                    cnx.id(),
                    e
                );
            }
        }

        info!(
            "[{}][{}] Closed consumer {}",
            self.inner.config.topic, self.inner.config.subscription_name, self.inner.consumer_name
        );
        self.inner.handlers.emit_close();
        Ok(())
    }

    /// Resolves once the consumer has been closed.
    pub async fn closed(&self) {
        loop {
            let notified = self.inner.message_available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_closed() {
                return;
            }
            notified.await;
        }
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn topic(&self) -> &str {
        &self.inner.config.topic
    }

    pub fn subscription(&self) -> &str {
        &self.inner.config.subscription_name
    }

    pub fn consumer_name(&self) -> &str {
        &self.inner.consumer_name
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.inner.config
    }

    pub fn delivery_mode(&self) -> DeliveryMode {
        match self.inner.admission {
            AdmissionPolicy::BufferAndWake => DeliveryMode::Pull,
            AdmissionPolicy::DispatchImmediately(_) => DeliveryMode::Listener,
        }
    }

    pub fn has_listener(&self) -> bool {
        self.delivery_mode() == DeliveryMode::Listener
    }

    /// Current connection, if any.
    pub fn cnx(&self) -> Option<Arc<dyn Connection>> {
        self.inner.lock_state().ok().and_then(|state| state.cnx())
    }

    pub fn is_connected(&self) -> bool {
        self.inner
            .lock_state()
            .map(|state| state.is_connected())
            .unwrap_or(false)
    }

    pub fn is_closed(&self) -> bool {
        self.inner
            .lock_state()
            .map(|state| state.is_closed())
            .unwrap_or(true)
    }

    /// Whether a receive has asked for a message that has not arrived yet.
    pub fn is_awaiting_message(&self) -> bool {
        self.inner
            .lock_state()
            .map(|state| state.awaiting_message())
            .unwrap_or(false)
    }

    /// Id of the last message handed out by the receive path.
    pub fn last_dequeued_message(&self) -> Option<MessageId> {
        self.inner
            .lock_state()
            .ok()
            .and_then(|state| state.last_dequeued())
    }

    /// Number of messages sitting in the handoff buffer.
    pub fn buffered_messages(&self) -> usize {
        self.inner
            .lock_state()
            .map(|state| state.buffered())
            .unwrap_or(0)
    }

    pub fn stats(&self) -> ConsumerStatsSnapshot {
        self.inner.stats.snapshot()
    }

    pub(crate) fn emit_error(&self, event: ErrorEvent) {
        self.inner.handlers.emit_error(event);
    }
}
