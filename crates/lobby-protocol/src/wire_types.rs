//! Event names and envelope shapes.
//!
//! This module defines:
//! - The fixed table of client event names ([`WireEvent`]).
//! - The raw `{ "event", "data" }` envelope before payload typing.
//!
//! The actual encode/decode logic lives in `json_codec`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use lobby_core::ClientEvent;

/// Client → server event names.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WireEvent {
    CreateLobby,
    JoinLobby,
    UpdateMachine,
    SelectSong,
    LeaveLobby,
    SpectateLobby,
    SearchLobby,
    LobbyState,
}

impl WireEvent {
    pub const ALL: [WireEvent; 8] = [
        WireEvent::CreateLobby,
        WireEvent::JoinLobby,
        WireEvent::UpdateMachine,
        WireEvent::SelectSong,
        WireEvent::LeaveLobby,
        WireEvent::SpectateLobby,
        WireEvent::SearchLobby,
        WireEvent::LobbyState,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WireEvent::CreateLobby => "createLobby",
            WireEvent::JoinLobby => "joinLobby",
            WireEvent::UpdateMachine => "updateMachine",
            WireEvent::SelectSong => "selectSong",
            WireEvent::LeaveLobby => "leaveLobby",
            WireEvent::SpectateLobby => "spectateLobby",
            WireEvent::SearchLobby => "searchLobby",
            WireEvent::LobbyState => "lobbyState",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        WireEvent::ALL.into_iter().find(|event| event.as_str() == name)
    }

    pub fn of(event: &ClientEvent) -> Self {
        match event {
            ClientEvent::CreateLobby(_) => WireEvent::CreateLobby,
            ClientEvent::JoinLobby(_) => WireEvent::JoinLobby,
            ClientEvent::UpdateMachine(_) => WireEvent::UpdateMachine,
            ClientEvent::SelectSong(_) => WireEvent::SelectSong,
            ClientEvent::LeaveLobby => WireEvent::LeaveLobby,
            ClientEvent::SpectateLobby(_) => WireEvent::SpectateLobby,
            ClientEvent::SearchLobby => WireEvent::SearchLobby,
            ClientEvent::LobbyState => WireEvent::LobbyState,
        }
    }
}

/// An inbound envelope whose payload has not been typed yet.
///
/// `event` is optional so that a missing name can be told apart from a
/// body that is not JSON at all.
#[derive(Debug, Deserialize)]
pub struct RawEnvelope {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// An outbound client envelope (used by clients and tests).
#[derive(Debug, Serialize)]
pub struct Envelope<'a> {
    pub event: &'a str,
    pub data: Value,
}
