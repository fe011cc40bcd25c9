//! Delivery seam for push events.

use crate::connection::ConnectionId;
use hookbin_model::Identity;
use hookbin_protocol::ServerEvent;
use parking_lot::Mutex;

/// Who an event is delivered to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Every live connection.
    Broadcast,
    /// Every live connection belonging to one identity.
    Group(Identity),
    /// Exactly one connection.
    Connection(ConnectionId),
}

/// A push-delivery adapter.
///
/// Implementations map the two delivery primitives onto a concrete transport
/// (WebSocket hub, SSE fan-out, a test recorder). Delivery is fire-and-forget
/// from the engine's point of view: there is no synchronous failure surface,
/// and disconnected clients catch up through reconnect reconciliation rather
/// than message replay.
pub trait EventSink: Send + Sync {
    /// Delivers an event to every live connection.
    fn broadcast(&self, event: &ServerEvent);

    /// Delivers an event to every connection of one identity.
    fn send_to_group(&self, identity: &Identity, event: &ServerEvent);

    /// Delivers an event to a single connection.
    fn send_to_connection(&self, connection: ConnectionId, event: &ServerEvent);
}

/// An [`EventSink`] that records deliveries, for tests.
#[derive(Debug, Default)]
pub struct MockSink {
    deliveries: Mutex<Vec<(Audience, ServerEvent)>>,
}

impl MockSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every delivery so far, in emission order.
    pub fn deliveries(&self) -> Vec<(Audience, ServerEvent)> {
        self.deliveries.lock().clone()
    }

    /// Returns the events delivered to a given audience.
    pub fn events_for(&self, audience: &Audience) -> Vec<ServerEvent> {
        self.deliveries
            .lock()
            .iter()
            .filter(|(a, _)| a == audience)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Forgets all recorded deliveries.
    pub fn clear(&self) {
        self.deliveries.lock().clear();
    }
}

impl EventSink for MockSink {
    fn broadcast(&self, event: &ServerEvent) {
        self.deliveries
            .lock()
            .push((Audience::Broadcast, event.clone()));
    }

    fn send_to_group(&self, identity: &Identity, event: &ServerEvent) {
        self.deliveries
            .lock()
            .push((Audience::Group(identity.clone()), event.clone()));
    }

    fn send_to_connection(&self, connection: ConnectionId, event: &ServerEvent) {
        self.deliveries
            .lock()
            .push((Audience::Connection(connection), event.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_audiences() {
        let sink = MockSink::new();
        let identity = Identity::new("a@x.com").unwrap();
        let conn = ConnectionId::next();

        sink.broadcast(&ServerEvent::AllCleared);
        sink.send_to_group(&identity, &ServerEvent::AllCleared);
        sink.send_to_connection(conn, &ServerEvent::AllCleared);

        let deliveries = sink.deliveries();
        assert_eq!(deliveries.len(), 3);
        assert_eq!(deliveries[0].0, Audience::Broadcast);
        assert_eq!(deliveries[1].0, Audience::Group(identity.clone()));
        assert_eq!(deliveries[2].0, Audience::Connection(conn));

        assert_eq!(sink.events_for(&Audience::Group(identity)).len(), 1);
    }
}
