//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! Socket I/O runs in small Tokio tasks (one accept loop, one reader and
//! one writer per connection). They only shuttle bytes through channels;
//! the relay core sees nothing but [`TransportEvent`]s drained by
//! [`WebSocketTransport::poll`] on the loop task.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::{Channel, ConnectionId, Transport, TransportError, TransportEvent};

/// Messages a connection's writer may have queued before new ones are
/// dropped.
pub const DEFAULT_SEND_QUEUE: usize = 256;

/// Pause after a failed `accept` (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// What the I/O tasks report back to the transport.
enum Inbound {
    Connected(ConnectionId, mpsc::Sender<Bytes>),
    Received(ConnectionId, Vec<u8>),
    Closed(ConnectionId),
}

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    local_addr: SocketAddr,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    pending: VecDeque<Inbound>,
    /// Per-connection writer queues. Dropping a sender closes the socket.
    outbound: HashMap<ConnectionId, mpsc::Sender<Bytes>>,
    accept_task: JoinHandle<()>,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address and starts
    /// accepting connections in the background.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        Self::bind_with_queue(addr, DEFAULT_SEND_QUEUE).await
    }

    /// Like [`bind`](Self::bind), with `send_queue` messages of room in
    /// each connection's writer queue. A peer that falls that far behind
    /// loses messages instead of growing the queue.
    pub async fn bind_with_queue(addr: &str, send_queue: usize) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        let local_addr =
            listener.local_addr().map_err(TransportError::BindFailed)?;
        tracing::info!(%local_addr, "WebSocket transport listening");

        let (tx, rx) = mpsc::unbounded_channel();
        let accept_task = tokio::spawn(accept_loop(listener, tx, send_queue.max(1)));

        Ok(Self {
            local_addr,
            inbound: rx,
            pending: VecDeque::new(),
            outbound: HashMap::new(),
            accept_task,
        })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn translate(&mut self, inbound: Inbound) -> TransportEvent {
        match inbound {
            Inbound::Connected(id, writer) => {
                self.outbound.insert(id, writer);
                TransportEvent::Connected(id)
            }
            Inbound::Received(id, data) => TransportEvent::Received(id, data),
            Inbound::Closed(id) => {
                self.outbound.remove(&id);
                TransportEvent::Disconnected(id)
            }
        }
    }
}

impl Transport for WebSocketTransport {
    type Error = TransportError;

    fn poll(&mut self) -> Vec<TransportEvent> {
        while let Ok(inbound) = self.inbound.try_recv() {
            self.pending.push_back(inbound);
        }
        let drained: Vec<Inbound> = self.pending.drain(..).collect();
        drained
            .into_iter()
            .map(|inbound| self.translate(inbound))
            .collect()
    }

    fn send(&mut self, connection: ConnectionId, data: Bytes, _channel: Channel) {
        match self.outbound.get(&connection) {
            Some(writer) => match writer.try_send(data) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(%connection, "send queue full, message dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::trace!(%connection, "writer gone, message dropped");
                }
            },
            None => {
                tracing::trace!(%connection, "send to unknown connection dropped");
            }
        }
    }

    async fn ready(&mut self) -> Result<(), Self::Error> {
        if !self.pending.is_empty() {
            return Ok(());
        }
        match self.inbound.recv().await {
            Some(inbound) => {
                self.pending.push_back(inbound);
                Ok(())
            }
            None => Err(TransportError::Shutdown),
        }
    }

    async fn shutdown(&mut self) -> Result<(), Self::Error> {
        self.accept_task.abort();
        // Writers close their sockets once their queue sender is dropped.
        self.outbound.clear();
        tracing::info!(local_addr = %self.local_addr, "WebSocket transport shut down");
        Ok(())
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn accept_loop(
    listener: TcpListener,
    events: mpsc::UnboundedSender<Inbound>,
    send_queue: usize,
) {
    let mut next_id: u64 = 1;
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                let err = TransportError::AcceptFailed(e);
                tracing::warn!(error = %err, "accept failed");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };

        let id = ConnectionId::new(next_id);
        next_id += 1;
        tracing::debug!(%id, %addr, "accepted TCP connection");

        tokio::spawn(serve_connection(id, stream, events.clone(), send_queue));
    }
}

async fn serve_connection(
    id: ConnectionId,
    stream: TcpStream,
    events: mpsc::UnboundedSender<Inbound>,
    send_queue: usize,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::debug!(%id, error = %e, "WebSocket upgrade failed");
            return;
        }
    };
    let (mut sink, mut source) = ws.split();

    let (writer_tx, mut writer_rx) = mpsc::channel::<Bytes>(send_queue);
    if events.send(Inbound::Connected(id, writer_tx)).is_err() {
        return;
    }

    tokio::spawn(async move {
        while let Some(data) = writer_rx.recv().await {
            if let Err(e) = sink.send(Message::binary(data)).await {
                let err = TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e,
                ));
                tracing::debug!(%id, error = %err, "send failed");
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(msg) = source.next().await {
        let data = match msg {
            Ok(Message::Binary(data)) => data.to_vec(),
            Ok(Message::Text(text)) => text.as_bytes().to_vec(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue, // skip ping/pong/frame
            Err(e) => {
                let err = TransportError::ReceiveFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    e,
                ));
                tracing::debug!(%id, error = %err, "receive failed");
                break;
            }
        };
        if events.send(Inbound::Received(id, data)).is_err() {
            return;
        }
    }

    tracing::debug!(%id, "connection closed");
    let _ = events.send(Inbound::Closed(id));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(transport: &mut WebSocketTransport, id: u64, capacity: usize) -> mpsc::Receiver<Bytes> {
        let (tx, rx) = mpsc::channel(capacity);
        transport.outbound.insert(ConnectionId::new(id), tx);
        rx
    }

    #[tokio::test]
    async fn test_send_full_queue_drops_only_overflow() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let mut slow = queue(&mut transport, 1, 2);
        let mut fast = queue(&mut transport, 2, 2);

        for byte in [1u8, 2, 3] {
            transport.send(ConnectionId::new(1), Bytes::from(vec![byte]), Channel::Reliable);
        }
        transport.send(ConnectionId::new(2), Bytes::from_static(&[9]), Channel::Reliable);

        assert_eq!(slow.try_recv().unwrap(), Bytes::from_static(&[1]));
        assert_eq!(slow.try_recv().unwrap(), Bytes::from_static(&[2]));
        assert!(slow.try_recv().is_err());
        assert_eq!(fast.try_recv().unwrap(), Bytes::from_static(&[9]));

        // Once drained, the slow peer's queue accepts messages again.
        transport.send(ConnectionId::new(1), Bytes::from_static(&[4]), Channel::Reliable);
        assert_eq!(slow.try_recv().unwrap(), Bytes::from_static(&[4]));
    }

    #[tokio::test]
    async fn test_send_unknown_connection_is_ignored() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();

        transport.send(ConnectionId::new(42), Bytes::from_static(&[1]), Channel::Reliable);

        assert!(transport.outbound.is_empty());
    }
}
