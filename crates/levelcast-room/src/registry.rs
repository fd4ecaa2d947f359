//! Room registry: which players are in which room.

use std::collections::HashMap;

use levelcast_protocol::{PlayerId, RoomId};

use crate::room::Room;
use crate::{RoomConfig, RoomError, RoomInfo};

/// Tracks every non-empty room and which room each player is in.
///
/// A player can be in at most ONE room at a time (key invariant). Rooms
/// appear on first join and disappear when their last occupant leaves,
/// so `rooms` never holds an empty room.
#[derive(Debug)]
pub struct RoomRegistry {
    /// Active rooms, keyed by level id.
    rooms: HashMap<RoomId, Room>,

    /// Maps each player to the room they're currently in.
    player_rooms: HashMap<PlayerId, RoomId>,

    config: RoomConfig,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            config,
        }
    }

    /// Adds a player to a room, creating the room if needed.
    ///
    /// Returns the other occupants as they were *before* the player was
    /// added, in join order. Joining the room you're already in changes
    /// nothing and returns the same list.
    ///
    /// # Errors
    /// - [`RoomError::AlreadyInRoom`] if the player is in a different room
    /// - [`RoomError::RoomFull`] if the room is at capacity
    pub fn join(
        &mut self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<Vec<PlayerId>, RoomError> {
        if let Some(current) = self.player_rooms.get(&player_id).copied() {
            if current != room_id {
                return Err(RoomError::AlreadyInRoom(player_id, current));
            }
            return Ok(self
                .rooms
                .get(&room_id)
                .map(|room| room.others(player_id))
                .unwrap_or_default());
        }

        if let Some(room) = self.rooms.get(&room_id) {
            if !self.config.has_space(room.occupants.len()) {
                return Err(RoomError::RoomFull(room_id));
            }
        }

        let room = self.rooms.entry(room_id).or_insert_with(|| {
            tracing::info!(%room_id, "room created");
            Room::new(room_id)
        });
        let others = room.occupants.clone();
        room.occupants.push(player_id);
        self.player_rooms.insert(player_id, room_id);

        tracing::debug!(
            %room_id,
            %player_id,
            occupants = room.occupants.len(),
            "player joined room"
        );
        Ok(others)
    }

    /// Removes a player from a room.
    ///
    /// Returns the occupants still in the room afterwards, in join order.
    /// The room is destroyed if that list is empty.
    ///
    /// # Errors
    /// [`RoomError::NotInRoom`] if the player is not an occupant of
    /// `room_id` (including when the room doesn't exist).
    pub fn leave(
        &mut self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<Vec<PlayerId>, RoomError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::NotInRoom(player_id, room_id))?;

        if !room.remove(player_id) {
            return Err(RoomError::NotInRoom(player_id, room_id));
        }
        self.player_rooms.remove(&player_id);

        let remaining = room.occupants.clone();
        tracing::debug!(
            %room_id,
            %player_id,
            occupants = remaining.len(),
            "player left room"
        );

        if remaining.is_empty() {
            self.rooms.remove(&room_id);
            tracing::info!(%room_id, "room destroyed");
        }
        Ok(remaining)
    }

    /// Current occupants of a room in join order. Empty if the room
    /// doesn't exist.
    pub fn occupants_of(&self, room_id: RoomId) -> &[PlayerId] {
        self.rooms
            .get(&room_id)
            .map(|room| room.occupants.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the room a player is currently in, if any.
    pub fn room_of(&self, player_id: PlayerId) -> Option<RoomId> {
        self.player_rooms.get(&player_id).copied()
    }

    /// Returns `true` if the room currently exists (has occupants).
    pub fn contains(&self, room_id: RoomId) -> bool {
        self.rooms.contains_key(&room_id)
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lists all active room ids, ascending.
    pub fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Summaries of all active rooms, ascending by id.
    pub fn list(&self) -> Vec<RoomInfo> {
        let mut infos: Vec<RoomInfo> = self.rooms.values().map(Room::info).collect();
        infos.sort_by_key(|info| info.room_id);
        infos
    }

    /// The configuration this registry enforces.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
