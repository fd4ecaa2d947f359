//! The session manager: connect/disconnect lifecycle, room membership,
//! and fan-out.
//!
//! Owns the [`PlayerStore`] and the [`RoomRegistry`] and is the only
//! thing that mutates either. It does no I/O: every handler returns the
//! [`Outbound`] messages the event loop should send.
//!
//! ## Per-player state machine
//!
//! ```text
//!   connect ──→ Connected ──JOIN_LEVEL──→ InRoom
//!                   ▲                       │
//!                   └──────LEAVE_LEVEL──────┘
//!
//!   disconnect (from either state) ──→ gone (implicit LEAVE first)
//! ```

use levelcast_protocol::{ClientMessage, PlayerId, RoomId, ServerMessage};
use levelcast_room::{RoomConfig, RoomError, RoomRegistry};
use levelcast_session::{Player, PlayerStore};
use levelcast_transport::{Channel, ConnectionId, TransportEvent};

use crate::{SessionConfig, Violation};

/// A message addressed to one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub connection: ConnectionId,
    pub message: ServerMessage,
    pub channel: Channel,
}

impl Outbound {
    /// Addresses `message` on the channel its type normally uses.
    pub fn new(connection: ConnectionId, message: ServerMessage) -> Self {
        let channel = message.channel();
        Self {
            connection,
            message,
            channel,
        }
    }

    /// Addresses `message` on the reliable channel, whatever its type.
    pub fn reliable(connection: ConnectionId, message: ServerMessage) -> Self {
        Self {
            connection,
            message,
            channel: Channel::Reliable,
        }
    }
}

/// Drives the relay protocol for every connected player.
///
/// Sends are collected in order: the event loop must deliver them in the
/// order returned.
#[derive(Debug)]
pub struct SessionManager {
    players: PlayerStore,
    rooms: RoomRegistry,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(config: SessionConfig, room_config: RoomConfig) -> Self {
        Self {
            players: PlayerStore::new(),
            rooms: RoomRegistry::new(room_config),
            config,
        }
    }

    /// Handles one transport event and returns what to send.
    pub fn handle_event(&mut self, event: TransportEvent) -> Vec<Outbound> {
        let mut out = Vec::new();
        match event {
            TransportEvent::Connected(connection) => self.on_connect(connection, &mut out),
            TransportEvent::Received(connection, data) => {
                self.on_receive(connection, &data, &mut out)
            }
            TransportEvent::Disconnected(connection) => self.on_disconnect(connection, &mut out),
        }
        out
    }

    /// Applies one decoded message from `player_id`, which must be a
    /// connected player.
    ///
    /// # Errors
    /// Returns the [`Violation`] if the message breaks the protocol. No
    /// state changes and nothing is sent in that case.
    pub fn handle_message(
        &mut self,
        player_id: PlayerId,
        message: ClientMessage,
    ) -> Result<Vec<Outbound>, Violation> {
        let mut out = Vec::new();
        self.dispatch(player_id, message, &mut out)?;
        Ok(out)
    }

    /// Disconnects every player through the normal disconnect path.
    ///
    /// Players are dropped in id order; those still connected are told
    /// about each departure.
    pub fn disconnect_all(&mut self) -> Vec<Outbound> {
        let mut connections: Vec<(PlayerId, ConnectionId)> = self
            .players
            .iter()
            .map(|p| (p.player_id, p.connection))
            .collect();
        connections.sort_by_key(|(player_id, _)| *player_id);

        let mut out = Vec::new();
        for (_, connection) in connections {
            self.on_disconnect(connection, &mut out);
        }
        out
    }

    pub fn players(&self) -> &PlayerStore {
        &self.players
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    // -----------------------------------------------------------------
    // Transport events
    // -----------------------------------------------------------------

    fn on_connect(&mut self, connection: ConnectionId, out: &mut Vec<Outbound>) {
        match self.players.register(connection) {
            Ok(player_id) => {
                tracing::info!(%player_id, %connection, "player connected");
                out.push(Outbound::new(
                    connection,
                    ServerMessage::Welcome { player_id },
                ));
            }
            Err(e) => tracing::error!(%connection, error = %e, "connect event ignored"),
        }
    }

    fn on_receive(&mut self, connection: ConnectionId, data: &[u8], out: &mut Vec<Outbound>) {
        let Some(player_id) = self.players.lookup(connection) else {
            tracing::warn!(%connection, len = data.len(), "data from unknown connection dropped");
            return;
        };

        let message = match ClientMessage::decode(data) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "malformed packet dropped");
                return;
            }
        };

        let tag = message.tag();
        if let Err(violation) = self.dispatch(player_id, message, out) {
            tracing::warn!(%player_id, %tag, %violation, "protocol violation, packet dropped");
        }
    }

    fn on_disconnect(&mut self, connection: ConnectionId, out: &mut Vec<Outbound>) {
        let Some(player_id) = self.players.lookup(connection) else {
            tracing::warn!(%connection, "disconnect from unknown connection ignored");
            return;
        };

        self.leave(player_id, out);
        match self.players.unregister(player_id) {
            Ok(_) => tracing::info!(%player_id, %connection, "player disconnected"),
            Err(e) => contract_violation(&e),
        }
    }

    // -----------------------------------------------------------------
    // Client messages
    // -----------------------------------------------------------------

    fn dispatch(
        &mut self,
        player_id: PlayerId,
        message: ClientMessage,
        out: &mut Vec<Outbound>,
    ) -> Result<(), Violation> {
        match message {
            ClientMessage::JoinLevel { room_id } => self.join(player_id, room_id, out)?,
            ClientMessage::LeaveLevel => self.leave(player_id, out),
            ClientMessage::RenderData(frame) => {
                let Some(player) = self.player_mut(player_id) else {
                    return Ok(());
                };
                player.last_render_frame = frame;
                self.relay(
                    player_id,
                    ServerMessage::RenderDataRelay { player_id, frame },
                    out,
                );
            }
            ClientMessage::Appearance(appearance) => {
                let Some(player) = self.player_mut(player_id) else {
                    return Ok(());
                };
                player.appearance = appearance;
                self.relay(
                    player_id,
                    ServerMessage::AppearanceRelay {
                        player_id,
                        appearance,
                    },
                    out,
                );
            }
            ClientMessage::Username(username) => {
                let max = self.config.max_username_len;
                if username.len() > max {
                    return Err(Violation::UsernameTooLong {
                        len: username.len(),
                        max,
                    });
                }
                let Some(player) = self.player_mut(player_id) else {
                    return Ok(());
                };
                player.username.clone_from(&username);
                tracing::debug!(%player_id, %username, "username set");
                self.relay(
                    player_id,
                    ServerMessage::UsernameRelay {
                        player_id,
                        username,
                    },
                    out,
                );
            }
        }
        Ok(())
    }

    /// JOIN_LEVEL: registry join, then the snapshot exchange.
    ///
    /// The joiner gets a full snapshot of every other occupant (in join
    /// order) and each of them gets a full snapshot of the joiner. The
    /// snapshot is the only copy of a still player's pose, so all of it
    /// goes out reliably.
    fn join(
        &mut self,
        player_id: PlayerId,
        room_id: RoomId,
        out: &mut Vec<Outbound>,
    ) -> Result<(), Violation> {
        let Some(joiner) = self.player(player_id) else {
            return Ok(());
        };
        if let Some(current) = joiner.room_id {
            return Err(Violation::AlreadyInRoom(current));
        }

        let others = match self.rooms.join(room_id, player_id) {
            Ok(others) => others,
            Err(RoomError::RoomFull(room_id)) => return Err(Violation::RoomFull(room_id)),
            Err(e) => {
                contract_violation(&e);
                return Ok(());
            }
        };

        let Some(joiner) = self.player(player_id) else {
            return Ok(());
        };
        let joiner_connection = joiner.connection;
        let joiner_snapshot = snapshot(joiner);

        for other_id in &others {
            let Some(other) = self.player(*other_id) else {
                continue;
            };
            out.extend(
                snapshot(other)
                    .into_iter()
                    .map(|message| Outbound::reliable(joiner_connection, message)),
            );
            out.extend(
                joiner_snapshot
                    .iter()
                    .cloned()
                    .map(|message| Outbound::reliable(other.connection, message)),
            );
        }

        if let Some(joiner) = self.player_mut(player_id) {
            joiner.room_id = Some(room_id);
        }
        tracing::info!(%player_id, %room_id, others = others.len(), "player joined level");
        Ok(())
    }

    /// LEAVE_LEVEL (and the first half of disconnect). A no-op outside a
    /// room.
    fn leave(&mut self, player_id: PlayerId, out: &mut Vec<Outbound>) {
        let Some(room_id) = self.player(player_id).and_then(|p| p.room_id) else {
            tracing::debug!(%player_id, "leave while not in a room ignored");
            return;
        };

        match self.rooms.leave(room_id, player_id) {
            Ok(remaining) => {
                for other_id in remaining {
                    self.send_to(other_id, ServerMessage::PlayerLeft { player_id }, out);
                }
            }
            Err(e) => contract_violation(&e),
        }

        if let Some(player) = self.player_mut(player_id) {
            player.room_id = None;
        }
        tracing::info!(%player_id, %room_id, "player left level");
    }

    /// Sends `message` to everyone in the sender's room except the sender.
    fn relay(&self, sender: PlayerId, message: ServerMessage, out: &mut Vec<Outbound>) {
        let Some(room_id) = self.player(sender).and_then(|p| p.room_id) else {
            return;
        };
        for &other_id in self.rooms.occupants_of(room_id) {
            if other_id != sender {
                self.send_to(other_id, message.clone(), out);
            }
        }
    }

    // -----------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------

    fn send_to(&self, player_id: PlayerId, message: ServerMessage, out: &mut Vec<Outbound>) {
        if let Some(player) = self.player(player_id) {
            out.push(Outbound::new(player.connection, message));
        }
    }

    /// Looks up a player the caller knows exists.
    fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players
            .get(player_id)
            .map_err(|e| contract_violation(&e))
            .ok()
    }

    fn player_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.players
            .get_mut(player_id)
            .map_err(|e| contract_violation(&e))
            .ok()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default(), RoomConfig::default())
    }
}

/// Everything a newcomer needs to know about `player`, in send order.
fn snapshot(player: &Player) -> [ServerMessage; 4] {
    let player_id = player.player_id;
    [
        ServerMessage::PlayerJoined { player_id },
        ServerMessage::AppearanceRelay {
            player_id,
            appearance: player.appearance,
        },
        ServerMessage::UsernameRelay {
            player_id,
            username: player.username.clone(),
        },
        ServerMessage::RenderDataRelay {
            player_id,
            frame: player.last_render_frame,
        },
    ]
}

/// The store and registry disagree. Panics in debug builds; in release
/// the operation is skipped.
fn contract_violation(error: &dyn std::error::Error) {
    tracing::error!(%error, "player store and room registry out of sync");
    debug_assert!(false, "player store and room registry out of sync: {error}");
}

// =========================================================================
// Tests
// =========================================================================
