//! Error types for the room layer.

use levelcast_protocol::{PlayerId, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The player is already in a different room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The player is not in this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// The room has reached its configured capacity.
    #[error("room {0} is full")]
    RoomFull(RoomId),
}
