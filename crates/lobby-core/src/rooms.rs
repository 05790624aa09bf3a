//! Room membership index.
//!
//! Maps a lobby code to the connections that should receive that lobby's
//! broadcasts (machines and spectators alike). It is a derived index: the
//! lobby manager keeps it in sync with each lobby's member maps and it
//! never decides on its own whether a lobby exists.

use std::collections::{BTreeSet, HashMap};

use tracing::warn;

use crate::ids::{ConnectionId, LobbyCode};

#[derive(Debug, Default)]
pub struct RoomIndex {
    rooms: HashMap<LobbyCode, BTreeSet<ConnectionId>>,
}

impl RoomIndex {
    pub fn new() -> Self {
        RoomIndex::default()
    }

    /// Add `id` to the room. Returns false (and warns) if it was already there.
    pub fn join(&mut self, id: ConnectionId, code: &LobbyCode) -> bool {
        let inserted = self.rooms.entry(code.clone()).or_default().insert(id);
        if !inserted {
            warn!(connection = %id, room = %code, "connection already joined room");
        }
        inserted
    }

    /// Remove `id` from the room. Empty rooms are dropped.
    pub fn leave(&mut self, id: ConnectionId, code: &LobbyCode) -> bool {
        let Some(members) = self.rooms.get_mut(code) else {
            warn!(connection = %id, room = %code, "leave for unknown room");
            return false;
        };

        let removed = members.remove(&id);
        if !removed {
            warn!(connection = %id, room = %code, "connection was not in room");
        }
        if members.is_empty() {
            self.rooms.remove(code);
        }
        removed
    }

    pub fn is_joined(&self, id: ConnectionId, code: &LobbyCode) -> bool {
        self.rooms
            .get(code)
            .is_some_and(|members| members.contains(&id))
    }

    /// Current members of a room, in connection-id order.
    pub fn members<'a>(&'a self, code: &LobbyCode) -> impl Iterator<Item = ConnectionId> + 'a {
        self.rooms
            .get(code)
            .into_iter()
            .flat_map(|members| members.iter().copied())
    }

    pub fn member_count(&self, code: &LobbyCode) -> usize {
        self.rooms.get(code).map_or(0, BTreeSet::len)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn clear(&mut self) {
        self.rooms.clear();
    }
}
