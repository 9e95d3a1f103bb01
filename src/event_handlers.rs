//! Consumer lifecycle event handlers.
//!
//! Provides callback-based hooks for monitoring a zero-queue consumer:
//!
//! - [`on_connect`](EventHandlers::on_connect): a connection was installed by a reconnect
//! - [`on_disconnect`](EventHandlers::on_disconnect): the current connection went away
//! - [`on_error`](EventHandlers::on_error): flow-credit or reconnect failures
//! - [`on_flow`](EventHandlers::on_flow): debug hook fired for every credit grant
//! - [`on_close`](EventHandlers::on_close): the consumer was closed
//!
//! Handlers are always invoked after the consumer's connection-state lock has
//! been released, so they may call back into the consumer.
//!
//! # Example
//!
//! ```rust
//! use zeroq_link::EventHandlers;
//!
//! let handlers = EventHandlers::new()
//!     .on_connect(|cnx| println!("Connected on {}", cnx))
//!     .on_disconnect(|reason| println!("Disconnected: {}", reason))
//!     .on_error(|error| eprintln!("Consumer error: {}", error));
//! ```

use crate::connection::ConnectionId;
use std::fmt;
use std::sync::Arc;

/// Why the transport dropped a connection, as reported to `on_disconnect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectReason(String);

impl DisconnectReason {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A failure reported to `on_error`.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub message: String,
    /// Whether a reconnect may resolve the error.
    pub recoverable: bool,
}

impl ErrorEvent {
    pub fn new(message: impl Into<String>, recoverable: bool) -> Self {
        Self {
            message: message.into(),
            recoverable,
        }
    }
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.recoverable { "recoverable" } else { "fatal" };
        write!(f, "{} ({})", self.message, kind)
    }
}

/// Permits granted on `connection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowEvent {
    pub connection: ConnectionId,
    pub permits: u32,
}

/// A registered callback taking one event value.
pub type Handler<T> = Arc<dyn Fn(T) + Send + Sync>;

fn fire<T>(handler: &Option<Handler<T>>, event: T) {
    if let Some(handler) = handler {
        handler(event);
    }
}

/// Lifecycle callbacks for a consumer. Every slot is optional.
#[derive(Clone, Default)]
pub struct EventHandlers {
    connect: Option<Handler<ConnectionId>>,
    disconnect: Option<Handler<DisconnectReason>>,
    error: Option<Handler<ErrorEvent>>,
    flow: Option<Handler<FlowEvent>>,
    close: Option<Handler<()>>,
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<&str> = [
            ("connect", self.connect.is_some()),
            ("disconnect", self.disconnect.is_some()),
            ("error", self.error.is_some()),
            ("flow", self.flow.is_some()),
            ("close", self.close.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect();
        f.debug_struct("EventHandlers").field("registered", &registered).finish()
    }
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fired after a reconnect installs `ConnectionId` as the current connection.
    pub fn on_connect(mut self, f: impl Fn(ConnectionId) + Send + Sync + 'static) -> Self {
        self.connect = Some(Arc::new(f));
        self
    }

    /// Fired when the current connection is reported lost. Close reports for
    /// an already replaced connection are not forwarded.
    pub fn on_disconnect(mut self, f: impl Fn(DisconnectReason) + Send + Sync + 'static) -> Self {
        self.disconnect = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(ErrorEvent) + Send + Sync + 'static) -> Self {
        self.error = Some(Arc::new(f));
        self
    }

    /// Fired for each permit grant the broker accepted; useful when
    /// debugging credit accounting.
    pub fn on_flow(mut self, f: impl Fn(FlowEvent) + Send + Sync + 'static) -> Self {
        self.flow = Some(Arc::new(f));
        self
    }

    /// Fired once, by the first `close()`.
    pub fn on_close(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.close = Some(Arc::new(move |()| f()));
        self
    }

    pub(crate) fn emit_connect(&self, connection: ConnectionId) {
        fire(&self.connect, connection);
    }

    pub(crate) fn emit_disconnect(&self, reason: DisconnectReason) {
        fire(&self.disconnect, reason);
    }

    pub(crate) fn emit_error(&self, error: ErrorEvent) {
        fire(&self.error, error);
    }

    pub(crate) fn emit_flow(&self, event: FlowEvent) {
        fire(&self.flow, event);
    }

    pub(crate) fn emit_close(&self) {
        fire(&self.close, ());
    }
}
