//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and talk to it
//! with a `tokio-tungstenite` client, so bytes actually cross a socket.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use bytes::Bytes;
    use futures_util::{SinkExt, StreamExt};
    use levelcast_transport::{
        Channel, ConnectionId, Transport, TransportEvent, WebSocketTransport,
    };
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn connect_client(transport: &WebSocketTransport) -> ClientWs {
        let url = format!("ws://{}", transport.local_addr());
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("client should connect");
        ws
    }

    /// Waits (bounded) for the next batch of events.
    async fn next_events(transport: &mut WebSocketTransport) -> Vec<TransportEvent> {
        tokio::time::timeout(Duration::from_secs(5), transport.ready())
            .await
            .expect("transport should become ready")
            .expect("transport should still be running");
        transport.poll()
    }

    async fn expect_connected(transport: &mut WebSocketTransport) -> ConnectionId {
        match next_events(transport).await.as_slice() {
            [TransportEvent::Connected(id)] => *id,
            other => panic!("expected a single Connected event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_websocket_connect_send_and_receive() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");

        let mut client = connect_client(&transport).await;
        let id = expect_connected(&mut transport).await;
        assert!(id.into_inner() > 0);

        // Server → client.
        transport.send(id, Bytes::from_static(b"hello from server"), Channel::Reliable);
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"hello from server");

        // Client → server.
        client
            .send(Message::Binary(b"hello from client".to_vec().into()))
            .await
            .unwrap();
        let events = next_events(&mut transport).await;
        assert_eq!(
            events,
            vec![TransportEvent::Received(id, b"hello from client".to_vec())]
        );
    }

    #[tokio::test]
    async fn test_websocket_client_close_reports_disconnected() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");

        let mut client = connect_client(&transport).await;
        let id = expect_connected(&mut transport).await;

        client.send(Message::Close(None)).await.unwrap();

        let events = next_events(&mut transport).await;
        assert_eq!(events, vec![TransportEvent::Disconnected(id)]);
    }

    #[tokio::test]
    async fn test_websocket_unreliable_send_still_delivers() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");

        let mut client = connect_client(&transport).await;
        let id = expect_connected(&mut transport).await;

        transport.send(id, Bytes::from_static(&[1, 2, 3]), Channel::Unreliable);

        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_websocket_shutdown_closes_clients() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");

        let mut client = connect_client(&transport).await;
        expect_connected(&mut transport).await;

        transport.shutdown().await.expect("shutdown should succeed");

        let next = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("client should observe the close");
        match next {
            None | Some(Ok(Message::Close(_))) | Some(Err(_)) => {}
            Some(Ok(other)) => panic!("expected close, got {other:?}"),
        }
    }
}
