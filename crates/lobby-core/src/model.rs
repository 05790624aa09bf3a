//! Lobby data model.
//!
//! - [`Player`]: one profile on a machine (identity + client-reported state).
//! - [`Machine`]: a cabinet occupying one lobby slot, hosting 0-2 players.
//! - [`Spectator`]: a watcher that receives room broadcasts.
//! - [`SongInfo`]: the song chosen for the current round.
//! - [`Lobby`]: a code-addressed session grouping the above.
//!
//! The `*Info` / `*Update` types are what clients send; the stored types
//! additionally carry the owning [`ConnectionId`], which is never serialized.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::{ConnectionId, LobbyCode};
use crate::messages::{LobbyState, LobbySummary};

/// Maximum number of machines in a lobby.
pub const MAX_MACHINES: usize = 4;

/// Screen name clients report while on song select.
pub const SELECT_SCREEN: &str = "select";

/// A player profile as reported by its machine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    // Identity, kept across rounds
    pub player_id: String,
    pub profile_name: String,

    // Client UI state, e.g. "select" or "gameplay"
    #[serde(default)]
    pub screen_name: String,
    #[serde(default)]
    pub ready: bool,

    // Ephemeral, dropped when the lobby returns to song select
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl Player {
    pub fn is_on_select(&self) -> bool {
        self.screen_name == SELECT_SCREEN
    }

    /// Overwrite every field present in `update`.
    pub fn merge(&mut self, update: PlayerUpdate) {
        if let Some(player_id) = update.player_id {
            self.player_id = player_id;
        }
        if let Some(profile_name) = update.profile_name {
            self.profile_name = profile_name;
        }
        if let Some(screen_name) = update.screen_name {
            self.screen_name = screen_name;
        }
        if let Some(ready) = update.ready {
            self.ready = ready;
        }
        if update.score.is_some() {
            self.score = update.score;
        }
        if update.progress.is_some() {
            self.progress = update.progress;
        }
    }

    fn clear_round_results(&mut self) {
        self.score = None;
        self.progress = None;
    }
}

/// Partial player sent with `updateMachine`; absent fields are left as-is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

/// A machine as sent by `createLobby` / `joinLobby`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MachineInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player1: Option<Player>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player2: Option<Player>,
}

/// Partial machine sent by `updateMachine`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MachineUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player1: Option<PlayerUpdate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player2: Option<PlayerUpdate>,
}

/// A machine occupying a lobby slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    pub connection_id: ConnectionId,
    pub player1: Option<Player>,
    pub player2: Option<Player>,
}

impl Machine {
    pub fn new(connection_id: ConnectionId, info: MachineInfo) -> Self {
        Machine {
            connection_id,
            player1: info.player1,
            player2: info.player2,
        }
    }

    /// Occupied player slots, player 1 first.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.player1.iter().chain(self.player2.iter())
    }

    fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.player1.iter_mut().chain(self.player2.iter_mut())
    }

    pub fn player_count(&self) -> usize {
        self.players().count()
    }

    /// Merge a partial update slot by slot. An update for an empty slot
    /// seats a new player built from the fields provided.
    pub fn apply(&mut self, update: MachineUpdate) {
        merge_slot(&mut self.player1, update.player1);
        merge_slot(&mut self.player2, update.player2);
    }
}

fn merge_slot(slot: &mut Option<Player>, update: Option<PlayerUpdate>) {
    let Some(update) = update else {
        return;
    };
    slot.get_or_insert_with(Player::default).merge(update);
}

/// A spectator as sent by `spectateLobby`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpectatorInfo {
    pub profile_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spectator {
    pub connection_id: ConnectionId,
    pub profile_name: String,
}

/// The song selected for the current round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongInfo {
    pub song_path: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub step_artist: String,
    #[serde(default)]
    pub length_seconds: f64,
}

/// A multiplayer session.
///
/// Member maps keep insertion order so that `lobbyState` lists players
/// in the order their machines joined.
#[derive(Debug, Clone)]
pub struct Lobby {
    pub code: LobbyCode,

    /// Empty means public.
    pub password: String,

    pub machines: IndexMap<ConnectionId, Machine>,
    pub spectators: IndexMap<ConnectionId, Spectator>,

    /// Set once per round; cleared when everyone is back on song select.
    pub song_info: Option<SongInfo>,
}

impl Lobby {
    pub fn new(code: LobbyCode, password: impl Into<String>) -> Self {
        Lobby {
            code,
            password: password.into(),
            machines: IndexMap::new(),
            spectators: IndexMap::new(),
            song_info: None,
        }
    }

    pub fn is_password_protected(&self) -> bool {
        !self.password.is_empty()
    }

    /// Public lobbies accept any password; protected ones need an exact match.
    pub fn accepts_password(&self, password: &str) -> bool {
        !self.is_password_protected() || self.password == password
    }

    pub fn is_full(&self) -> bool {
        self.machines.len() >= MAX_MACHINES
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.machines.values().flat_map(|machine| machine.players())
    }

    /// Occupied player slots across all machines.
    pub fn player_count(&self) -> usize {
        self.machines.values().map(Machine::player_count).sum()
    }

    /// True when there is at least one player and every player is on
    /// song select.
    pub fn all_on_select(&self) -> bool {
        let mut players = self.players().peekable();
        players.peek().is_some() && players.all(Player::is_on_select)
    }

    /// Start a new round if every player has just reached song select.
    ///
    /// `was_on_select` is [`all_on_select`](Lobby::all_on_select) from
    /// before the change. Returns whether the round was reset.
    pub fn reset_round_on_return(&mut self, was_on_select: bool) -> bool {
        if was_on_select || !self.all_on_select() {
            return false;
        }
        self.start_new_round();
        true
    }

    /// Forget the previous round: song and per-player results.
    pub fn start_new_round(&mut self) {
        self.song_info = None;
        for machine in self.machines.values_mut() {
            machine.players_mut().for_each(Player::clear_round_results);
        }
    }

    /// Snapshot broadcast to the room.
    pub fn state(&self) -> LobbyState {
        LobbyState {
            players: self.players().cloned().collect(),
            code: self.code.clone(),
            song_info: self.song_info.clone(),
        }
    }

    pub fn summary(&self) -> LobbySummary {
        LobbySummary {
            code: self.code.clone(),
            is_password_protected: self.is_password_protected(),
            machine_count: self.player_count(),
            spectator_count: self.spectators.len(),
        }
    }
}
