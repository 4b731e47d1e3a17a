//! Client event bus
//!
//! Observers register one handler per [`ClientEvent`]. Handlers run inline
//! on the dispatching task; their failures are logged and never reach the
//! request they observe.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use dashmap::DashMap;
use feedstream_domain::{impl_wire_name_conversions, ErrorKind, HttpMethod};
use thiserror::Error;
use tracing::warn;

/// Kind of event emitted around each dispatched request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientEvent {
    /// Before the request reaches the transport
    Request,
    /// After the transport answered or failed
    Response,
}

impl_wire_name_conversions!(ClientEvent {
    Request => "request",
    Response => "response",
});

/// Data passed to event handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientEventPayload {
    pub event: ClientEvent,
    pub method: HttpMethod,
    pub url: String,
    /// Response status, when a response arrived
    pub status: Option<u16>,
    /// Failure classification, when the request failed
    pub error: Option<ErrorKind>,
}

impl ClientEventPayload {
    pub fn request(method: HttpMethod, url: impl Into<String>) -> Self {
        Self { event: ClientEvent::Request, method, url: url.into(), status: None, error: None }
    }

    pub fn response(
        method: HttpMethod,
        url: impl Into<String>,
        status: Option<u16>,
        error: Option<ErrorKind>,
    ) -> Self {
        Self { event: ClientEvent::Response, method, url: url.into(), status, error }
    }
}

/// Failure reported by an event handler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event handler failed: {0}")]
pub struct HookError(pub String);

/// Registered event handler
pub type EventHandler =
    Arc<dyn Fn(&ClientEventPayload) -> std::result::Result<(), HookError> + Send + Sync>;

/// Per-client registry of event handlers
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<DashMap<ClientEvent, EventHandler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler` for `event`, replacing and returning any previous one.
    pub fn set_handler<F>(&self, event: ClientEvent, handler: F) -> Option<EventHandler>
    where
        F: Fn(&ClientEventPayload) -> std::result::Result<(), HookError> + Send + Sync + 'static,
    {
        self.handlers.insert(event, Arc::new(handler))
    }

    pub fn remove_handler(&self, event: ClientEvent) -> Option<EventHandler> {
        self.handlers.remove(&event).map(|(_, handler)| handler)
    }

    /// Remove every handler.
    pub fn clear_handlers(&self) {
        self.handlers.clear();
    }

    pub fn has_handler(&self, event: ClientEvent) -> bool {
        self.handlers.contains_key(&event)
    }

    /// Run the handler for `payload.event`, if any.
    ///
    /// Errors and panics raised by the handler are logged and swallowed.
    pub fn emit(&self, payload: &ClientEventPayload) {
        // clone out so the map is unlocked while the handler runs
        let Some(handler) = self.handlers.get(&payload.event).map(|h| Arc::clone(h.value())) else {
            return;
        };

        match catch_unwind(AssertUnwindSafe(|| handler(payload))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(event = %payload.event, error = %e, "event handler returned an error");
            }
            Err(_) => warn!(event = %payload.event, "event handler panicked"),
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let events: Vec<ClientEvent> = self.handlers.iter().map(|entry| *entry.key()).collect();
        f.debug_struct("EventBus").field("handlers", &events).finish()
    }
}
