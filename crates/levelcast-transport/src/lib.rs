//! Transport abstraction layer for Levelcast.
//!
//! The relay core never touches sockets. It sees a transport as three
//! things: a non-blocking [`Transport::poll`] that yields
//! [`TransportEvent`]s, a fire-and-forget [`Transport::send`], and an
//! async [`Transport::ready`] the event loop parks on when there is
//! nothing to do.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use memory::{MemoryTransport, SentMessage};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketTransport, DEFAULT_SEND_QUEUE};

use std::fmt;

use bytes::Bytes;

/// Opaque identifier for a connection.
///
/// Owned by the transport. The relay keys its lookups on it but never
/// writes it to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// The delivery guarantee requested for an outgoing message.
///
/// Transports that have no unreliable mode (WebSocket) deliver
/// everything reliably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channel {
    /// Delivered in order, no loss.
    #[default]
    Reliable,

    /// May be dropped. Used for high-frequency pose updates where only
    /// the latest value matters.
    Unreliable,
}

/// Something that happened on the transport since the last poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A peer finished connecting.
    Connected(ConnectionId),

    /// A peer went away. The id is never reported again afterwards.
    Disconnected(ConnectionId),

    /// One complete message arrived from a peer.
    Received(ConnectionId, Vec<u8>),
}

/// A source of connection events and a sink for outgoing bytes.
pub trait Transport: 'static {
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Drains every event that is already pending, without waiting.
    ///
    /// Events come back in delivery order. An empty vector means
    /// nothing happened since the last call.
    fn poll(&mut self) -> Vec<TransportEvent>;

    /// Queues `data` for delivery to `connection`.
    ///
    /// Best-effort: unknown or closed connections are ignored, and
    /// failures are the transport's own business.
    fn send(&mut self, connection: ConnectionId, data: Bytes, channel: Channel);

    /// Waits until [`poll`](Self::poll) has at least one event to return.
    ///
    /// # Errors
    /// Returns an error once the transport can never produce events
    /// again (e.g., the listener died).
    async fn ready(&mut self) -> Result<(), Self::Error>;

    /// Stops accepting connections and closes the ones that are open.
    async fn shutdown(&mut self) -> Result<(), Self::Error>;
}
