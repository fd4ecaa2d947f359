//! Error types for the player store.

use levelcast_protocol::PlayerId;
use levelcast_transport::ConnectionId;

/// Errors returned by [`PlayerStore`](crate::PlayerStore).
///
/// Callers that got a `PlayerId` from the store itself should never
/// see `NotFound`; when they do, an invariant is broken upstream.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No player is registered under this id (never was, or already
    /// unregistered).
    #[error("no player registered as {0}")]
    NotFound(PlayerId),

    /// The transport reported the same connection twice.
    #[error("{0} is already registered")]
    AlreadyRegistered(ConnectionId),

    /// Every player id has been handed out.
    #[error("player ids exhausted")]
    IdsExhausted,
}
