//! # Levelcast
//!
//! Real-time relay server for multiplayer levels.
//!
//! Clients connect, say which level (room) they are playing, and stream
//! small state updates (appearance, username, render frames). The relay
//! caches the latest of each per player and fans every update out to the
//! other occupants of the same room. A player joining a room gets a
//! snapshot of everyone already there, and they get one of the joiner.
//!
//! ```text
//! Transport → RelayServer (event loop) → SessionManager → PlayerStore
//!                                                      → RoomRegistry
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use levelcast::prelude::*;
//!
//! # async fn run() -> Result<(), LevelcastError> {
//! let mut server = RelayServer::builder()
//!     .bind("0.0.0.0:23973")
//!     .build()
//!     .await?;
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await
//! # }
//! ```

mod config;
mod error;
mod server;
mod session;

pub use config::{ServerConfig, SessionConfig, DEFAULT_PORT};
pub use error::{LevelcastError, Violation};
pub use server::{RelayServer, RelayServerBuilder};
pub use session::{Outbound, SessionManager};

/// Convenient re-exports for embedding the relay.
pub mod prelude {
    pub use crate::{
        LevelcastError, Outbound, RelayServer, RelayServerBuilder, ServerConfig, SessionConfig,
        SessionManager, Violation,
    };
    pub use levelcast_protocol::{
        Appearance, ClientMessage, PlayerId, RenderFrame, RoomId, ServerMessage,
    };
    pub use levelcast_room::RoomConfig;
    pub use levelcast_transport::{
        Channel, ConnectionId, MemoryTransport, Transport, TransportEvent, WebSocketTransport,
    };
}
