//! Connection registry.
//!
//! Maps a [`ConnectionId`] to a sendable transport handle and owns id
//! allocation. All sends are best effort: unknown ids and closed
//! transports are logged and skipped, never awaited or retried.

use std::collections::HashMap;

use lobby_core::{ConnectionId, LobbyCode, RoomIndex, ServerEvent};
use lobby_protocol::encode_server_event;
use tracing::{debug, info, warn};

/// What the registry needs from a transport connection.
pub trait Transport {
    fn is_open(&self) -> bool;

    /// Queue one text frame. Returns false if the transport refused it.
    fn send_text(&self, text: &str) -> bool;

    fn close(&self);

    /// Whether both handles refer to the same underlying connection.
    fn same_transport(&self, other: &Self) -> bool;
}

#[derive(Debug)]
pub struct ConnectionRegistry<T> {
    connections: HashMap<ConnectionId, T>,
    next_id: u64,
}

impl<T> Default for ConnectionRegistry<T> {
    fn default() -> Self {
        ConnectionRegistry {
            connections: HashMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Transport> ConnectionRegistry<T> {
    pub fn new() -> Self {
        ConnectionRegistry::default()
    }

    /// Register `handle` under a fresh id.
    ///
    /// A handle that is already registered keeps its existing id.
    pub fn connect(&mut self, handle: T) -> ConnectionId {
        if let Some(existing) = self
            .connections
            .iter()
            .find(|(_, registered)| registered.same_transport(&handle))
            .map(|(id, _)| *id)
        {
            warn!(connection = %existing, "transport already registered");
            return existing;
        }

        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.connections.insert(id, handle);
        debug!(connection = %id, "connection registered");
        id
    }

    /// Returns whether the transport accepted the frame.
    pub fn send_direct(&self, id: ConnectionId, event: &ServerEvent) -> bool {
        let Some(handle) = self.connections.get(&id) else {
            warn!(connection = %id, "send to unknown connection");
            return false;
        };
        if !handle.is_open() {
            warn!(connection = %id, "send to closed connection");
            return false;
        }
        encode(event).is_some_and(|text| deliver(id, handle, &text))
    }

    /// Send to every open connection in the lobby's room.
    ///
    /// Returns how many members accepted the frame.
    pub fn send_room(&self, event: &ServerEvent, code: &LobbyCode, rooms: &RoomIndex) -> usize {
        let Some(text) = encode(event) else {
            return 0;
        };
        let mut delivered = 0;
        for id in rooms.members(code) {
            match self.connections.get(&id) {
                Some(handle) if handle.is_open() => {
                    if deliver(id, handle, &text) {
                        delivered += 1;
                    }
                }
                _ => debug!(connection = %id, room = %code, "skipping unreachable room member"),
            }
        }
        delivered
    }

    /// Send to every open connection. Returns how many accepted the frame.
    pub fn send_broadcast(&self, event: &ServerEvent) -> usize {
        let Some(text) = encode(event) else {
            return 0;
        };
        self.connections
            .iter()
            .filter(|(_, handle)| handle.is_open())
            .filter(|(id, handle)| deliver(**id, *handle, &text))
            .count()
    }

    /// Notify, close and forget a connection.
    ///
    /// Returns false (and warns) if `id` is unknown.
    pub fn disconnect(&mut self, id: ConnectionId, reason: Option<String>) -> bool {
        let Some(handle) = self.connections.remove(&id) else {
            warn!(connection = %id, "disconnect of unknown connection");
            return false;
        };

        if handle.is_open() {
            if let Some(text) = encode(&ServerEvent::client_disconnected(reason.clone())) {
                deliver(id, &handle, &text);
            }
        }
        handle.close();
        info!(connection = %id, reason = reason.as_deref().unwrap_or("-"), "connection closed");
        true
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Forget every connection without notifying or closing it.
    pub fn clear(&mut self) {
        self.connections.clear();
    }
}

fn deliver<T: Transport>(id: ConnectionId, handle: &T, text: &str) -> bool {
    let accepted = handle.send_text(text);
    if !accepted {
        debug!(connection = %id, "transport refused frame");
    }
    accepted
}

fn encode(event: &ServerEvent) -> Option<String> {
    match encode_server_event(event) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(error = %e, "failed to encode server event");
            None
        }
    }
}
