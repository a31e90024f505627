//! The in-memory room table.

use std::collections::HashMap;

use rand::Rng;
use typerace_protocol::RoomId;

use crate::{Room, RoomError};

/// Characters used in generated room codes.
const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random draws tried before giving up on finding a free code.
const MAX_ID_ATTEMPTS: usize = 64;

/// All open rooms, keyed by room code.
///
/// Codes are random and only unique among rooms that currently exist;
/// a collision with an open room is regenerated, up to a fixed number of
/// attempts.
#[derive(Debug)]
pub struct RoomStore {
    rooms: HashMap<RoomId, Room>,
    id_len: usize,
}

impl RoomStore {
    /// Creates an empty store that generates codes `id_len` characters long.
    pub fn new(id_len: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            id_len: id_len.max(1),
        }
    }

    /// Creates a room under a fresh code and returns the code.
    ///
    /// Fails with [`RoomError::NoFreeRoomId`] when every code is taken, or
    /// when so many are that random draws keep colliding.
    pub fn create(&mut self, max_players: u32, text: String) -> Result<RoomId, RoomError> {
        if self.rooms.len() >= self.capacity() {
            return Err(RoomError::NoFreeRoomId);
        }
        let room_id = (0..MAX_ID_ATTEMPTS)
            .map(|_| generate_room_id(self.id_len))
            .find(|id| !self.rooms.contains_key(id))
            .ok_or(RoomError::NoFreeRoomId)?;

        self.rooms
            .insert(room_id.clone(), Room::new(room_id.clone(), max_players, text));
        Ok(room_id)
    }

    /// How many distinct codes of `id_len` characters exist.
    fn capacity(&self) -> usize {
        u32::try_from(self.id_len)
            .ok()
            .and_then(|len| ROOM_ID_ALPHABET.len().checked_pow(len))
            .unwrap_or(usize::MAX)
    }

    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn get_mut(&mut self, room_id: &RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    /// Deletes a room, returning it if it existed.
    pub fn remove(&mut self, room_id: &RoomId) -> Option<Room> {
        self.rooms.remove(room_id)
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Number of open rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

fn generate_room_id(len: usize) -> RoomId {
    let mut rng = rand::rng();
    let code: String = (0..len)
        .map(|_| ROOM_ID_ALPHABET[rng.random_range(0..ROOM_ID_ALPHABET.len())] as char)
        .collect();
    RoomId::new(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_returns_six_char_uppercase_code() {
        let mut store = RoomStore::new(6);
        let id = store.create(4, "text".into()).unwrap();

        assert_eq!(id.as_str().len(), 6);
        assert!(
            id.as_str()
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        );
    }

    #[test]
    fn test_created_room_is_fresh() {
        let mut store = RoomStore::new(6);
        let id = store.create(2, "text".into()).unwrap();

        let room = store.get(&id).unwrap();
        assert!(!room.is_started());
        assert_eq!(room.creator(), None);
        assert_eq!(room.player_count(), 0);
        assert_eq!(room.max_players(), 2);
        assert_eq!(room.id(), &id);
    }

    #[test]
    fn test_codes_are_unique_among_open_rooms() {
        // One-character codes force collisions, exercising regeneration.
        let mut store = RoomStore::new(1);
        for _ in 0..8 {
            store.create(1, "t".into()).unwrap();
        }
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn test_create_fails_once_every_code_is_taken() {
        let mut store = RoomStore::new(1);
        for &b in ROOM_ID_ALPHABET {
            let id = RoomId::new((b as char).to_string());
            store.rooms.insert(id.clone(), Room::new(id, 1, "t".into()));
        }

        let err = store.create(1, "t".into()).unwrap_err();
        assert!(matches!(err, RoomError::NoFreeRoomId));
        assert_eq!(store.len(), ROOM_ID_ALPHABET.len());

        store.remove(&RoomId::new("Q"));
        assert_eq!(store.create(1, "t".into()).unwrap(), RoomId::new("Q"));
    }

    #[test]
    fn test_remove_deletes_room() {
        let mut store = RoomStore::new(6);
        let id = store.create(2, "text".into()).unwrap();

        assert!(store.remove(&id).is_some());
        assert!(!store.contains(&id));
        assert!(store.is_empty());
        assert!(store.remove(&id).is_none());
    }
}
