//! The player store: every connected player, by id and by connection.
//!
//! # Concurrency note
//!
//! `PlayerStore` is a plain pair of `HashMap`s with no locking. It is
//! owned by the session manager, which lives on the single event-loop
//! task, so every mutation is already serialized.

use std::collections::HashMap;

use levelcast_protocol::PlayerId;
use levelcast_transport::ConnectionId;

use crate::{Player, SessionError};

/// Registry of connected players.
///
/// ## Lifecycle
///
/// ```text
/// register(conn) ──→ get / get_mut ... ──→ unregister(id)
///       │                                        │
///       ▼                                        ▼
///  [id assigned]                          [record removed,
///                                          id never reused]
/// ```
///
/// The store knows nothing about rooms. Whoever unregisters a player
/// must take them out of their room first.
#[derive(Debug)]
pub struct PlayerStore {
    /// All players, keyed by their server-assigned id.
    players: HashMap<PlayerId, Player>,

    /// Index from transport connection to player. Kept in sync with
    /// `players`.
    connections: HashMap<ConnectionId, PlayerId>,

    /// The id the next `register` hands out.
    next_id: u32,
}

impl PlayerStore {
    /// Creates an empty store. The first player gets id 1.
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            connections: HashMap::new(),
            next_id: 1,
        }
    }

    /// Creates a player record for a fresh connection.
    ///
    /// The new player has no room and default cached state.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyRegistered`] if `connection` already
    /// has a player. No id is consumed in that case.
    ///
    /// Returns [`SessionError::IdsExhausted`] once the id counter has run
    /// out. Ids are never reused, so the store stays full from then on.
    pub fn register(&mut self, connection: ConnectionId) -> Result<PlayerId, SessionError> {
        if self.connections.contains_key(&connection) {
            return Err(SessionError::AlreadyRegistered(connection));
        }

        let player_id = PlayerId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(SessionError::IdsExhausted)?;

        self.connections.insert(connection, player_id);
        self.players
            .insert(player_id, Player::new(player_id, connection));

        tracing::debug!(%player_id, %connection, "player registered");
        Ok(player_id)
    }

    /// Looks up a player.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the id is not registered.
    pub fn get(&self, player_id: PlayerId) -> Result<&Player, SessionError> {
        self.players
            .get(&player_id)
            .ok_or(SessionError::NotFound(player_id))
    }

    /// Looks up a player for in-place mutation.
    ///
    /// This is the only way to change cached player state.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the id is not registered.
    pub fn get_mut(&mut self, player_id: PlayerId) -> Result<&mut Player, SessionError> {
        self.players
            .get_mut(&player_id)
            .ok_or(SessionError::NotFound(player_id))
    }

    /// Removes a player and returns their final record.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the id is not registered.
    pub fn unregister(&mut self, player_id: PlayerId) -> Result<Player, SessionError> {
        let player = self
            .players
            .remove(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;
        self.connections.remove(&player.connection);

        tracing::debug!(%player_id, connection = %player.connection, "player unregistered");
        Ok(player)
    }

    /// Finds the player on a connection.
    pub fn lookup(&self, connection: ConnectionId) -> Option<PlayerId> {
        self.connections.get(&connection).copied()
    }

    /// Iterates over all players, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Returns the number of connected players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Returns `true` if nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Default for PlayerStore {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `PlayerStore`.
    //!
    //! Naming follows `test_{function}_{scenario}_{expected}`.

    use levelcast_protocol::{Appearance, RenderFrame, RoomId};

    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    // =====================================================================
    // register()
    // =====================================================================

    #[test]
    fn test_register_assigns_dense_increasing_ids() {
        let mut store = PlayerStore::new();

        let a = store.register(conn(10)).unwrap();
        let b = store.register(conn(20)).unwrap();
        let c = store.register(conn(5)).unwrap();

        assert_eq!((a, b, c), (PlayerId(1), PlayerId(2), PlayerId(3)));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_register_new_player_has_default_state() {
        let mut store = PlayerStore::new();
        let id = store.register(conn(1)).unwrap();

        let player = store.get(id).unwrap();

        assert_eq!(player.player_id, id);
        assert_eq!(player.connection, conn(1));
        assert_eq!(player.room_id, None);
        assert!(!player.in_room());
        assert!(player.username.is_empty());
        assert_eq!(player.appearance, Appearance::default());
        assert_eq!(player.last_render_frame, RenderFrame::default());
    }

    #[test]
    fn test_register_same_connection_twice_returns_error() {
        let mut store = PlayerStore::new();
        store.register(conn(1)).unwrap();

        let result = store.register(conn(1));

        assert!(matches!(result, Err(SessionError::AlreadyRegistered(c)) if c == conn(1)));
        assert_eq!(store.len(), 1);
        // The failed call must not burn an id.
        assert_eq!(store.register(conn(2)).unwrap(), PlayerId(2));
    }

    #[test]
    fn test_register_last_id_then_exhausted() {
        let mut store = PlayerStore::new();
        store.next_id = u32::MAX - 1;

        let last = store.register(conn(1)).unwrap();
        let result = store.register(conn(2));

        assert_eq!(last, PlayerId(u32::MAX - 1));
        assert!(matches!(result, Err(SessionError::IdsExhausted)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup(conn(2)), None);
    }

    #[test]
    fn test_register_when_exhausted_stays_empty() {
        let mut store = PlayerStore::new();
        store.next_id = u32::MAX;

        assert!(matches!(store.register(conn(1)), Err(SessionError::IdsExhausted)));
        assert!(matches!(store.register(conn(2)), Err(SessionError::IdsExhausted)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_register_never_reuses_ids_after_unregister() {
        let mut store = PlayerStore::new();
        let first = store.register(conn(1)).unwrap();
        store.unregister(first).unwrap();

        let second = store.register(conn(1)).unwrap();

        assert_ne!(first, second);
    }

    // =====================================================================
    // get() / get_mut()
    // =====================================================================

    #[test]
    fn test_get_mut_changes_are_visible_through_get() {
        let mut store = PlayerStore::new();
        let id = store.register(conn(1)).unwrap();

        {
            let player = store.get_mut(id).unwrap();
            player.username = "viprin".into();
            player.room_id = Some(RoomId(5));
            player.last_render_frame = RenderFrame::at(1.0, 2.0);
        }

        let player = store.get(id).unwrap();
        assert_eq!(player.username, "viprin");
        assert_eq!(player.room_id, Some(RoomId(5)));
        assert_eq!(player.last_render_frame, RenderFrame::at(1.0, 2.0));
    }

    #[test]
    fn test_get_unknown_id_returns_not_found() {
        let store = PlayerStore::new();

        let result = store.get(PlayerId(99));

        assert!(matches!(result, Err(SessionError::NotFound(p)) if p == PlayerId(99)));
    }

    #[test]
    fn test_get_mut_unknown_id_returns_not_found() {
        let mut store = PlayerStore::new();
        assert!(matches!(store.get_mut(PlayerId(1)), Err(SessionError::NotFound(_))));
    }

    // =====================================================================
    // unregister()
    // =====================================================================

    #[test]
    fn test_unregister_removes_record_and_connection_index() {
        let mut store = PlayerStore::new();
        let id = store.register(conn(7)).unwrap();

        let removed = store.unregister(id).unwrap();

        assert_eq!(removed.player_id, id);
        assert!(store.is_empty());
        assert_eq!(store.lookup(conn(7)), None);
        assert!(matches!(store.get(id), Err(SessionError::NotFound(_))));
    }

    #[test]
    fn test_unregister_twice_returns_not_found() {
        let mut store = PlayerStore::new();
        let id = store.register(conn(1)).unwrap();
        store.unregister(id).unwrap();

        let result = store.unregister(id);

        assert!(matches!(result, Err(SessionError::NotFound(p)) if p == id));
    }

    #[test]
    fn test_unregister_leaves_other_players_untouched() {
        let mut store = PlayerStore::new();
        let a = store.register(conn(1)).unwrap();
        let b = store.register(conn(2)).unwrap();

        store.unregister(a).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup(conn(2)), Some(b));
        assert!(store.get(b).is_ok());
    }

    // =====================================================================
    // lookup() / iter()
    // =====================================================================

    #[test]
    fn test_lookup_maps_connection_to_player() {
        let mut store = PlayerStore::new();
        let a = store.register(conn(100)).unwrap();

        assert_eq!(store.lookup(conn(100)), Some(a));
        assert_eq!(store.lookup(conn(101)), None);
    }

    #[test]
    fn test_iter_visits_every_player() {
        let mut store = PlayerStore::new();
        store.register(conn(1)).unwrap();
        store.register(conn(2)).unwrap();

        let mut ids: Vec<PlayerId> = store.iter().map(|p| p.player_id).collect();
        ids.sort();

        assert_eq!(ids, vec![PlayerId(1), PlayerId(2)]);
    }
}
