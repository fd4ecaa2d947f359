//! A single room: an ordered occupant list.

use levelcast_protocol::{PlayerId, RoomId};

/// Occupants of one level, in join order.
///
/// Join order is what callers see from `join`/`leave`/`occupants_of`,
/// so snapshot exchanges are deterministic.
#[derive(Debug)]
pub(crate) struct Room {
    pub(crate) room_id: RoomId,
    pub(crate) occupants: Vec<PlayerId>,
}

impl Room {
    pub(crate) fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            occupants: Vec::new(),
        }
    }

    /// Removes `player_id`, keeping the order of the rest. Returns
    /// `false` if they were not here.
    pub(crate) fn remove(&mut self, player_id: PlayerId) -> bool {
        match self.occupants.iter().position(|p| *p == player_id) {
            Some(index) => {
                self.occupants.remove(index);
                true
            }
            None => false,
        }
    }

    /// Everyone except `player_id`, in join order.
    pub(crate) fn others(&self, player_id: PlayerId) -> Vec<PlayerId> {
        self.occupants
            .iter()
            .copied()
            .filter(|p| *p != player_id)
            .collect()
    }

    pub(crate) fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            occupant_count: self.occupants.len(),
        }
    }
}

/// A snapshot of room metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    /// The room's level id.
    pub room_id: RoomId,
    /// Number of players currently in the room.
    pub occupant_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_with(ids: &[u32]) -> Room {
        let mut room = Room::new(RoomId(1));
        room.occupants = ids.iter().map(|id| PlayerId(*id)).collect();
        room
    }

    #[test]
    fn test_remove_keeps_join_order() {
        let mut room = room_with(&[1, 2, 3]);

        assert!(room.remove(PlayerId(2)));

        assert_eq!(room.occupants, vec![PlayerId(1), PlayerId(3)]);
    }

    #[test]
    fn test_remove_absent_player_returns_false() {
        let mut room = room_with(&[1]);
        assert!(!room.remove(PlayerId(9)));
        assert_eq!(room.occupants.len(), 1);
    }

    #[test]
    fn test_others_excludes_only_the_given_player() {
        let room = room_with(&[4, 5, 6]);
        assert_eq!(room.others(PlayerId(5)), vec![PlayerId(4), PlayerId(6)]);
        assert_eq!(room.others(PlayerId(9)).len(), 3);
    }
}
