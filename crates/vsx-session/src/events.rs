//! Observer events published by a session
//!
//! Every session publishes a single stream of [`SessionEvent`]s over a
//! broadcast channel. A [`Subscription`] either sees all of them or only the
//! ones published under one [`EventName`].

use tokio::sync::broadcast;
use tracing::warn;
use vsx_protocol::{DecodedEvent, EventName};

/// Unified event enum for all session activity
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Receiver woken and initial status requested
    Connected,
    /// Transport closed
    Disconnected,
    /// Transport failure
    Error {
        /// Human-readable description
        message: String,
    },
    /// A status line decoded from the receiver
    Decoded(DecodedEvent),
}

impl SessionEvent {
    /// Observer name this event is published under
    pub fn name(&self) -> EventName {
        match self {
            SessionEvent::Connected => EventName::Connect,
            SessionEvent::Disconnected => EventName::End,
            SessionEvent::Error { .. } => EventName::Error,
            SessionEvent::Decoded(event) => event.name(),
        }
    }
}

/// Receiving end of a session's event stream
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<SessionEvent>,
    filter: Option<EventName>,
}

impl Subscription {
    pub(crate) fn new(rx: broadcast::Receiver<SessionEvent>, filter: Option<EventName>) -> Self {
        Self { rx, filter }
    }

    /// Name this subscription is limited to, if any
    pub fn filter(&self) -> Option<EventName> {
        self.filter
    }

    /// Wait for the next matching event
    ///
    /// Returns `None` once the session and its task are gone.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Subscriber fell behind, {} events dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next matching event if one is already queued
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Subscriber fell behind, {} events dropped", skipped);
                }
                Err(_) => return None,
            }
        }
    }

    fn matches(&self, event: &SessionEvent) -> bool {
        self.filter.map_or(true, |name| event.name() == name)
    }
}
