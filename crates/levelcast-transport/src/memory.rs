//! In-process transport with no sockets.
//!
//! The test suites (and anyone embedding the relay) drive it by hand:
//! [`connect`](MemoryTransport::connect),
//! [`receive`](MemoryTransport::receive) and
//! [`disconnect`](MemoryTransport::disconnect) queue events, and
//! [`take_sent`](MemoryTransport::take_sent) collects what the relay sent.

use std::collections::{HashSet, VecDeque};

use bytes::Bytes;

use crate::{Channel, ConnectionId, Transport, TransportError, TransportEvent};

/// A message the relay handed to [`MemoryTransport::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Destination connection.
    pub connection: ConnectionId,
    /// Encoded bytes exactly as sent.
    pub data: Bytes,
    /// Requested delivery channel.
    pub channel: Channel,
}

/// A [`Transport`] backed by in-memory queues.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    next_id: u64,
    open: HashSet<ConnectionId>,
    pending: VecDeque<TransportEvent>,
    sent: Vec<SentMessage>,
    shut_down: bool,
}

impl MemoryTransport {
    /// Creates a transport with no connections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a new peer connecting. Returns its id.
    pub fn connect(&mut self) -> ConnectionId {
        self.next_id += 1;
        let id = ConnectionId::new(self.next_id);
        self.open.insert(id);
        self.pending.push_back(TransportEvent::Connected(id));
        id
    }

    /// Simulates `connection` sending one message.
    pub fn receive(&mut self, connection: ConnectionId, data: impl Into<Vec<u8>>) {
        self.pending
            .push_back(TransportEvent::Received(connection, data.into()));
    }

    /// Simulates `connection` going away.
    pub fn disconnect(&mut self, connection: ConnectionId) {
        self.pending.push_back(TransportEvent::Disconnected(connection));
    }

    /// Returns and clears everything sent since the last call.
    pub fn take_sent(&mut self) -> Vec<SentMessage> {
        std::mem::take(&mut self.sent)
    }

    /// Returns `true` if `connection` is connected and not yet reported gone.
    pub fn is_open(&self, connection: ConnectionId) -> bool {
        self.open.contains(&connection)
    }

    /// Returns `true` once [`Transport::shutdown`] has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl Transport for MemoryTransport {
    type Error = TransportError;

    fn poll(&mut self) -> Vec<TransportEvent> {
        let events: Vec<TransportEvent> = self.pending.drain(..).collect();
        for event in &events {
            if let TransportEvent::Disconnected(id) = event {
                self.open.remove(id);
            }
        }
        events
    }

    fn send(&mut self, connection: ConnectionId, data: Bytes, channel: Channel) {
        if !self.open.contains(&connection) {
            tracing::trace!(%connection, "send to closed connection dropped");
            return;
        }
        self.sent.push(SentMessage {
            connection,
            data,
            channel,
        });
    }

    async fn ready(&mut self) -> Result<(), Self::Error> {
        if self.shut_down {
            return Err(TransportError::Shutdown);
        }
        if self.pending.is_empty() {
            // Nobody else can push events while we hold `&mut self`.
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), Self::Error> {
        self.shut_down = true;
        self.open.clear();
        self.pending.clear();
        Ok(())
    }
}
