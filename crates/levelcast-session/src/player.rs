//! The server's record of one connected player.

use levelcast_protocol::{Appearance, PlayerId, RenderFrame, RoomId};
use levelcast_transport::ConnectionId;

/// One player per live connection.
///
/// Fields are public so the session manager can update them in place
/// through [`PlayerStore::get_mut`](crate::PlayerStore::get_mut). Not
/// `Clone`: there is exactly one copy, owned by the store.
#[derive(Debug)]
pub struct Player {
    /// Server-assigned id. Never changes while the connection lives.
    pub player_id: PlayerId,

    /// Transport handle this player arrived on. Server-side only.
    pub connection: ConnectionId,

    /// The room this player is in, if any.
    ///
    /// Mirrors the room registry's membership. Only the session manager
    /// writes it, in the same step as the registry update.
    pub room_id: Option<RoomId>,

    /// Last username received; empty until the client sends one.
    pub username: String,

    /// Last icon/colour selection received.
    pub appearance: Appearance,

    /// Last pose received; hidden default until the first RENDER_DATA.
    pub last_render_frame: RenderFrame,
}

impl Player {
    pub(crate) fn new(player_id: PlayerId, connection: ConnectionId) -> Self {
        Self {
            player_id,
            connection,
            room_id: None,
            username: String::new(),
            appearance: Appearance::default(),
            last_render_frame: RenderFrame::default(),
        }
    }

    /// Returns `true` if the player is currently in a room.
    pub fn in_room(&self) -> bool {
        self.room_id.is_some()
    }
}
