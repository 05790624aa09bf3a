//! Message types exchanged with the lobby coordinator.
//!
//! These are **transport-agnostic** logical messages:
//! - [`ClientEvent`]: what a connection asks the coordinator to do.
//! - [`ServerEvent`]: what the coordinator sends back.
//! - [`Effect`]: an outbound action recorded by the lobby manager,
//!   applied by whoever owns the connections.
//!
//! `ServerEvent` serializes to the `{ "event", "data" }` envelope directly.
//! Inbound envelopes are resolved to a `ClientEvent` by `lobby-protocol`,
//! which owns the event-name table.

use serde::{Deserialize, Serialize};

use crate::ids::{ConnectionId, LobbyCode};
use crate::model::{MachineInfo, MachineUpdate, Player, SongInfo, SpectatorInfo};

/// A request from a connection, one concrete payload per event.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    CreateLobby(CreateLobby),
    JoinLobby(JoinLobby),
    UpdateMachine(UpdateMachine),
    SelectSong(SelectSong),
    LeaveLobby,
    SpectateLobby(SpectateLobby),
    SearchLobby,

    /// Ask for a fresh `lobbyState` broadcast to the caller's room.
    LobbyState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLobby {
    #[serde(default)]
    pub machine: MachineInfo,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinLobby {
    #[serde(default)]
    pub machine: MachineInfo,
    pub code: LobbyCode,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMachine {
    pub machine: MachineUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectSong {
    pub song_info: SongInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectateLobby {
    #[serde(default)]
    pub spectator: SpectatorInfo,
    pub code: LobbyCode,
    #[serde(default)]
    pub password: String,
}

/// An event sent to one or more connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    LobbyState(LobbyState),
    ResponseStatus(ResponseStatus),
    LobbyLeft(LobbyLeft),
    LobbySpectated(LobbySpectated),
    LobbySearched(LobbySearched),
    ClientDisconnected(ClientDisconnected),
}

/// Room snapshot. Players are flattened from machines; connection
/// identifiers are not included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyState {
    pub players: Vec<Player>,
    pub code: LobbyCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_info: Option<SongInfo>,
}

/// Outcome of a request that has no richer reply, usually a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseStatus {
    /// Name of the request this answers, e.g. `"joinLobby"`.
    pub event: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyLeft {
    pub left: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbySpectated {
    pub spectators: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbySearched {
    pub lobbies: Vec<LobbySummary>,
}

/// One row of `searchLobby`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbySummary {
    pub code: LobbyCode,
    pub is_password_protected: bool,

    /// Occupied player slots, not machine entries.
    pub machine_count: usize,
    pub spectator_count: usize,
}

/// Final notification before the server closes a connection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientDisconnected {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Outbound action recorded by the lobby manager.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send to one connection.
    Direct(ConnectionId, ServerEvent),

    /// Send to every member of a lobby's room.
    Room(LobbyCode, ServerEvent),

    /// Notify and close a connection's transport.
    Disconnect(ConnectionId, Option<String>),
}

// -----------------------------------------------------------------------------
// Convenience constructors
// -----------------------------------------------------------------------------

impl ServerEvent {
    pub fn failure(event: impl Into<String>, message: impl Into<String>) -> Self {
        ServerEvent::ResponseStatus(ResponseStatus {
            event: event.into(),
            success: false,
            message: Some(message.into()),
        })
    }

    pub fn lobby_left(left: bool) -> Self {
        ServerEvent::LobbyLeft(LobbyLeft { left })
    }

    pub fn lobby_spectated(spectators: usize) -> Self {
        ServerEvent::LobbySpectated(LobbySpectated { spectators })
    }

    pub fn lobby_searched(lobbies: Vec<LobbySummary>) -> Self {
        ServerEvent::LobbySearched(LobbySearched { lobbies })
    }

    pub fn client_disconnected(reason: Option<String>) -> Self {
        ServerEvent::ClientDisconnected(ClientDisconnected { reason })
    }
}
