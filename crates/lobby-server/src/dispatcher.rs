//! Event handlers.
//!
//! One stateless function per client event, each taking the lobby
//! manager, the originating connection and that event's payload.
//!
//! Routing policy:
//! - A returned `ServerEvent` goes **only** to the originating connection.
//! - Mutating handlers broadcast through the manager's effects and return
//!   nothing on success; failures come back as a `responseStatus`.
//! - Queries (`leaveLobby`, `spectateLobby`, `searchLobby`) reply directly.

use lobby_core::{
    ClientEvent, ConnectionId, CreateLobby, JoinLobby, LobbyError, LobbyManager, SelectSong,
    ServerEvent, SpectateLobby, UpdateMachine,
};
use lobby_protocol::WireEvent;
use tracing::{debug, info};

/// Resolve a decoded event to its handler.
pub fn dispatch(
    manager: &mut LobbyManager,
    conn: ConnectionId,
    event: ClientEvent,
) -> Option<ServerEvent> {
    debug!(connection = %conn, event = WireEvent::of(&event).as_str(), "dispatching");
    match event {
        ClientEvent::CreateLobby(payload) => create_lobby(manager, conn, payload),
        ClientEvent::JoinLobby(payload) => join_lobby(manager, conn, payload),
        ClientEvent::UpdateMachine(payload) => update_machine(manager, conn, payload),
        ClientEvent::SelectSong(payload) => select_song(manager, conn, payload),
        ClientEvent::LeaveLobby => leave_lobby(manager, conn),
        ClientEvent::SpectateLobby(payload) => spectate_lobby(manager, conn, payload),
        ClientEvent::SearchLobby => search_lobby(manager),
        ClientEvent::LobbyState => lobby_state(manager, conn),
    }
}

pub fn create_lobby(
    manager: &mut LobbyManager,
    conn: ConnectionId,
    payload: CreateLobby,
) -> Option<ServerEvent> {
    manager.create_lobby(conn, payload.machine, payload.password);
    None
}

pub fn join_lobby(
    manager: &mut LobbyManager,
    conn: ConnectionId,
    payload: JoinLobby,
) -> Option<ServerEvent> {
    manager
        .join_lobby(conn, payload.machine, &payload.code, &payload.password)
        .err()
        .map(|e| failure(WireEvent::JoinLobby, conn, e))
}

pub fn update_machine(
    manager: &mut LobbyManager,
    conn: ConnectionId,
    payload: UpdateMachine,
) -> Option<ServerEvent> {
    manager
        .update_machine(conn, payload.machine)
        .err()
        .map(|e| failure(WireEvent::UpdateMachine, conn, e))
}

pub fn select_song(
    manager: &mut LobbyManager,
    conn: ConnectionId,
    payload: SelectSong,
) -> Option<ServerEvent> {
    manager
        .select_song(conn, payload.song_info)
        .err()
        .map(|e| failure(WireEvent::SelectSong, conn, e))
}

/// Machines leave their slot; a spectator calling this stops spectating.
pub fn leave_lobby(manager: &mut LobbyManager, conn: ConnectionId) -> Option<ServerEvent> {
    let left = manager.leave_lobby(conn) || manager.disconnect_spectator(conn);
    Some(ServerEvent::lobby_left(left))
}

pub fn spectate_lobby(
    manager: &mut LobbyManager,
    conn: ConnectionId,
    payload: SpectateLobby,
) -> Option<ServerEvent> {
    let spectators =
        manager.spectate_lobby(conn, payload.spectator, &payload.code, &payload.password);
    Some(ServerEvent::lobby_spectated(spectators))
}

pub fn search_lobby(manager: &LobbyManager) -> Option<ServerEvent> {
    Some(ServerEvent::lobby_searched(manager.search_lobbies()))
}

pub fn lobby_state(manager: &mut LobbyManager, conn: ConnectionId) -> Option<ServerEvent> {
    manager
        .request_state(conn)
        .err()
        .map(|e| failure(WireEvent::LobbyState, conn, e))
}

fn failure(event: WireEvent, conn: ConnectionId, error: LobbyError) -> ServerEvent {
    info!(connection = %conn, event = event.as_str(), %error, "request rejected");
    ServerEvent::failure(event.as_str(), error.to_string())
}
