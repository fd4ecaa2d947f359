//! Error types for the relay.

use std::path::PathBuf;

use levelcast_protocol::{ProtocolError, RoomId};
use levelcast_room::RoomError;
use levelcast_session::SessionError;
use levelcast_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `levelcast` crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant generates the `From` impls, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum LevelcastError {
    /// A transport-level error (bind, accept, shutdown).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A malformed or unknown packet.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A player-store error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-registry error.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The config file could not be read.
    #[error("failed to read config {}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for [`ServerConfig`](crate::ServerConfig).
    #[error("invalid config {}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A client broke the protocol. The packet is dropped, nothing changes,
/// and the connection stays open.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    /// JOIN_LEVEL while already in a room.
    #[error("already in {0}")]
    AlreadyInRoom(RoomId),

    /// JOIN_LEVEL into a room at capacity.
    #[error("{0} is full")]
    RoomFull(RoomId),

    /// USERNAME longer than the configured limit.
    #[error("username is {len} bytes, limit is {max}")]
    UsernameTooLong { len: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use levelcast_protocol::{FrameError, PlayerId};

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: LevelcastError = TransportError::Shutdown.into();
        assert!(matches!(err, LevelcastError::Transport(_)));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: LevelcastError = ProtocolError::from(FrameError::Empty).into();
        assert!(matches!(err, LevelcastError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err: LevelcastError = SessionError::NotFound(PlayerId(3)).into();
        assert!(matches!(err, LevelcastError::Session(_)));
        assert!(err.to_string().contains("P-3"));
    }

    #[test]
    fn test_from_room_error() {
        let err: LevelcastError = RoomError::RoomFull(RoomId(1)).into();
        assert!(matches!(err, LevelcastError::Room(_)));
    }

    #[test]
    fn test_violation_messages_name_the_limit() {
        let v = Violation::UsernameTooLong { len: 40, max: 32 };
        assert_eq!(v.to_string(), "username is 40 bytes, limit is 32");
        assert_eq!(Violation::RoomFull(RoomId(7)).to_string(), "R-7 is full");
    }
}
