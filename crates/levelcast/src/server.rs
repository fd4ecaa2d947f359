//! `RelayServer` builder and event loop.
//!
//! This is the entry point for running a relay. It ties together the
//! layers: transport → protocol → session manager → store/registry.
//!
//! The loop is single-threaded. Each turn drains every pending transport
//! event, dispatches them in delivery order, sends the results, and then
//! parks until the transport has more (or a stats tick, or shutdown).

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use levelcast_protocol::ServerMessage;
use levelcast_transport::{Transport, WebSocketTransport};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::{LevelcastError, Outbound, ServerConfig, SessionManager};

/// Builder for configuring and starting a WebSocket relay.
///
/// # Example
///
/// ```rust,ignore
/// use levelcast::prelude::*;
///
/// let server = RelayServer::builder()
///     .config(ServerConfig::load("levelcast.json")?)
///     .bind("0.0.0.0:23973")
///     .build()
///     .await?;
/// server.run().await
/// ```
#[derive(Debug, Clone, Default)]
pub struct RelayServerBuilder {
    config: ServerConfig,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.config.bind = addr.into();
        self
    }

    /// Replaces the whole configuration, bind address included.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the WebSocket listener and returns a server ready to run.
    pub async fn build(self) -> Result<RelayServer<WebSocketTransport>, LevelcastError> {
        let transport =
            WebSocketTransport::bind_with_queue(&self.config.bind, self.config.send_queue_len).await?;
        Ok(RelayServer::new(transport, &self.config))
    }
}

/// A relay over some [`Transport`].
///
/// Call [`run`](Self::run) or [`run_until`](Self::run_until) to serve,
/// or drive it by hand with [`pump`](Self::pump).
pub struct RelayServer<T: Transport> {
    transport: T,
    sessions: SessionManager,
    stats_interval: Option<Duration>,
}

impl RelayServer<WebSocketTransport> {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }
}

impl<T> RelayServer<T>
where
    T: Transport,
    LevelcastError: From<T::Error>,
{
    /// Wraps an already-running transport.
    pub fn new(transport: T, config: &ServerConfig) -> Self {
        Self {
            transport,
            sessions: SessionManager::new(config.session.clone(), config.room.clone()),
            stats_interval: config.stats_interval(),
        }
    }

    /// Handles every event the transport has pending, without waiting.
    ///
    /// Returns the number of events handled.
    pub fn pump(&mut self) -> usize {
        let events = self.transport.poll();
        let count = events.len();
        for event in events {
            let outbound = self.sessions.handle_event(event);
            self.deliver(outbound);
        }
        count
    }

    /// Serves until the transport fails.
    pub async fn run(mut self) -> Result<(), LevelcastError> {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `shutdown` resolves, then disconnects every player
    /// and shuts the transport down.
    ///
    /// # Errors
    /// Returns the transport's error if it stops producing events.
    pub async fn run_until(
        &mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), LevelcastError> {
        tokio::pin!(shutdown);
        let mut stats = StatsTicker::new(self.stats_interval);
        tracing::info!("relay running");

        let result = loop {
            self.pump();

            tokio::select! {
                ready = self.transport.ready() => {
                    if let Err(e) = ready {
                        tracing::error!(error = %e, "transport failed");
                        break Err(LevelcastError::from(e));
                    }
                }
                () = stats.tick() => self.log_stats(),
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break Ok(());
                }
            }
        };

        let outbound = self.sessions.disconnect_all();
        self.deliver(outbound);
        self.transport.shutdown().await?;
        tracing::info!("relay stopped");
        result
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Encodes and sends, in order. A fan-out produces the same message
    /// for several recipients back to back; it is encoded once.
    fn deliver(&mut self, outbound: Vec<Outbound>) {
        let mut encoded: Option<(ServerMessage, Bytes)> = None;
        for Outbound {
            connection,
            message,
            channel,
        } in outbound
        {
            let reuse = matches!(&encoded, Some((last, _)) if *last == message);
            if !reuse {
                let data = message.encode();
                encoded = Some((message, data));
            }
            if let Some((_, data)) = &encoded {
                self.transport.send(connection, data.clone(), channel);
            }
        }
    }

    fn log_stats(&self) {
        tracing::info!(
            players = self.sessions.players().len(),
            rooms = self.sessions.rooms().room_count(),
            "stats"
        );
    }
}

/// Periodic stats timer. Pends forever when stats are off.
struct StatsTicker {
    interval: Option<Interval>,
}

impl StatsTicker {
    fn new(period: Option<Duration>) -> Self {
        let interval = period.map(|period| {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });
        Self { interval }
    }

    async fn tick(&mut self) {
        match &mut self.interval {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending().await,
        }
    }
}
