//! Lobby store and lifecycle manager.
//!
//! - Owns every active [`Lobby`], keyed by [`LobbyCode`].
//! - Tracks which lobby each connection belongs to, separately for
//!   machines and spectators, and keeps the [`RoomIndex`] in step.
//! - Implements every lobby-mutating operation, including the cascading
//!   teardown when a lobby loses its last player.
//!
//! Operations never touch the network. Anything that must reach a
//! connection is recorded as an [`Effect`] and collected by the caller
//! with [`LobbyManager::take_effects`] after each operation.
//!
//! A connection holds at most one role at a time: joining, creating or
//! spectating first releases whatever role it held before.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::error::LobbyError;
use crate::ids::{ConnectionId, LobbyCode, LOBBY_CODE_LEN};
use crate::messages::{Effect, LobbyState, LobbySummary, ServerEvent};
use crate::model::{Lobby, Machine, MachineInfo, MachineUpdate, SongInfo, Spectator, SpectatorInfo};
use crate::rooms::RoomIndex;

/// Reason sent to spectators when their lobby closes under them.
pub const LOBBY_CLOSED_REASON: &str = "Lobby closed";

#[derive(Debug)]
pub struct LobbyManager {
    /// Code -> lobby. Ordered so searches list lobbies by code.
    lobbies: BTreeMap<LobbyCode, Lobby>,

    /// Connection -> lobby where it is a machine.
    machine_owner: HashMap<ConnectionId, LobbyCode>,

    /// Connection -> lobby where it is a spectator.
    spectator_owner: HashMap<ConnectionId, LobbyCode>,

    rooms: RoomIndex,

    /// Outbound actions not yet collected by the caller.
    effects: Vec<Effect>,

    rng: StdRng,
}

impl Default for LobbyManager {
    fn default() -> Self {
        LobbyManager::with_rng(StdRng::from_entropy())
    }
}

impl LobbyManager {
    pub fn new() -> Self {
        LobbyManager::default()
    }

    /// Manager with a deterministic code generator.
    pub fn with_seed(seed: u64) -> Self {
        LobbyManager::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        LobbyManager {
            lobbies: BTreeMap::new(),
            machine_owner: HashMap::new(),
            spectator_owner: HashMap::new(),
            rooms: RoomIndex::new(),
            effects: Vec::new(),
            rng,
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// True iff the lobby exists and accepts `password`.
    ///
    /// Unknown codes and wrong passwords are indistinguishable here.
    pub fn can_join(&self, code: &LobbyCode, password: &str) -> bool {
        self.lobbies
            .get(code)
            .is_some_and(|lobby| lobby.accepts_password(password))
    }

    /// Snapshot of every active lobby, ordered by code.
    pub fn search_lobbies(&self) -> Vec<LobbySummary> {
        self.lobbies.values().map(Lobby::summary).collect()
    }

    pub fn lobby(&self, code: &LobbyCode) -> Option<&Lobby> {
        self.lobbies.get(code)
    }

    pub fn lobby_state(&self, code: &LobbyCode) -> Option<LobbyState> {
        self.lobbies.get(code).map(Lobby::state)
    }

    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }

    /// Lobby in which `conn` is a machine.
    pub fn machine_lobby(&self, conn: ConnectionId) -> Option<&LobbyCode> {
        self.machine_owner.get(&conn)
    }

    /// Lobby in which `conn` is a spectator.
    pub fn spectator_lobby(&self, conn: ConnectionId) -> Option<&LobbyCode> {
        self.spectator_owner.get(&conn)
    }

    pub fn rooms(&self) -> &RoomIndex {
        &self.rooms
    }

    /// Drain the outbound actions recorded since the last call.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    // -------------------------------------------------------------------------
    // Lobby lifecycle
    // -------------------------------------------------------------------------

    /// Four uniform letters A-Z, redrawn until unused.
    pub fn generate_code(&mut self) -> LobbyCode {
        loop {
            let code: String = (0..LOBBY_CODE_LEN)
                .map(|_| char::from(self.rng.gen_range(b'A'..=b'Z')))
                .collect();
            if !self.lobbies.contains_key(code.as_str()) {
                return LobbyCode::new(code);
            }
        }
    }

    /// Open a new lobby with `conn` as its only machine.
    pub fn create_lobby(
        &mut self,
        conn: ConnectionId,
        machine: MachineInfo,
        password: impl Into<String>,
    ) -> LobbyCode {
        self.release_roles(conn);

        let code = self.generate_code();
        let mut lobby = Lobby::new(code.clone(), password);
        lobby.machines.insert(conn, Machine::new(conn, machine));
        let protected = lobby.is_password_protected();
        self.lobbies.insert(code.clone(), lobby);

        self.machine_owner.insert(conn, code.clone());
        self.rooms.join(conn, &code);

        info!(lobby = %code, connection = %conn, protected, "lobby created");
        self.broadcast_state(&code);
        code
    }

    /// Seat `conn` as a machine in an existing lobby.
    ///
    /// Rejected when the lobby cannot be joined with `password`, already
    /// holds the maximum number of machines, or has a song selected for
    /// the current round. A machine re-joining its own lobby skips the
    /// last two checks and has its entry replaced in place.
    pub fn join_lobby(
        &mut self,
        conn: ConnectionId,
        machine: MachineInfo,
        code: &LobbyCode,
        password: &str,
    ) -> Result<(), LobbyError> {
        if !self.can_join(code, password) {
            return Err(LobbyError::CannotJoin);
        }

        let rejoining = self.machine_owner.get(&conn) == Some(code);
        let lobby = self.lobbies.get(code).ok_or(LobbyError::CannotJoin)?;
        if !rejoining && lobby.is_full() {
            return Err(LobbyError::LobbyFull);
        }
        if !rejoining && lobby.song_info.is_some() {
            return Err(LobbyError::SongAlreadySelected);
        }

        if !rejoining {
            // Cannot cascade into `code`: a machine elsewhere only tears
            // down its own lobby, and spectators never tear anything down.
            self.release_roles(conn);
        }

        let lobby = self.lobbies.get_mut(code).ok_or(LobbyError::CannotJoin)?;
        lobby.machines.insert(conn, Machine::new(conn, machine));
        if !rejoining {
            self.machine_owner.insert(conn, code.clone());
            self.rooms.join(conn, code);
            info!(lobby = %code, connection = %conn, "machine joined");
        }

        self.broadcast_state(code);
        Ok(())
    }

    /// Merge a partial machine into the caller's stored machine.
    ///
    /// When this update brings every player back to song select, the
    /// round is over: the song and each player's score/progress are
    /// cleared, identity and readiness are kept.
    pub fn update_machine(
        &mut self,
        conn: ConnectionId,
        update: MachineUpdate,
    ) -> Result<(), LobbyError> {
        let code = self
            .machine_owner
            .get(&conn)
            .cloned()
            .ok_or(LobbyError::MachineNotFound)?;
        let lobby = self
            .lobbies
            .get_mut(&code)
            .ok_or(LobbyError::MachineNotFound)?;

        let was_on_select = lobby.all_on_select();
        lobby
            .machines
            .get_mut(&conn)
            .ok_or(LobbyError::MachineNotFound)?
            .apply(update);

        if lobby.reset_round_on_return(was_on_select) {
            debug!(lobby = %code, "all machines back on song select, round reset");
        }

        self.broadcast_state(&code);
        Ok(())
    }

    /// Fix the song for the current round. Only the first call per
    /// round succeeds.
    pub fn select_song(
        &mut self,
        conn: ConnectionId,
        song_info: SongInfo,
    ) -> Result<(), LobbyError> {
        let code = self
            .machine_owner
            .get(&conn)
            .cloned()
            .ok_or(LobbyError::LobbyNotFound)?;
        let lobby = self
            .lobbies
            .get_mut(&code)
            .ok_or(LobbyError::LobbyNotFound)?;

        if lobby.song_info.is_some() {
            return Err(LobbyError::SongAlreadySelected);
        }

        info!(lobby = %code, title = %song_info.title, "song selected");
        lobby.song_info = Some(song_info);
        self.broadcast_state(&code);
        Ok(())
    }

    /// Leave as a machine while keeping the connection open.
    pub fn leave_lobby(&mut self, conn: ConnectionId) -> bool {
        self.disconnect_machine(conn)
    }

    /// Watch a lobby. Returns the lobby's spectator count afterwards.
    ///
    /// - Unknown lobby: 0.
    /// - `conn` is a machine anywhere, or the password is rejected: the
    ///   request is ignored and the current count returned.
    /// - Otherwise any previous spectator role is released and `conn`
    ///   is added; it also receives the current `lobbyState` directly.
    pub fn spectate_lobby(
        &mut self,
        conn: ConnectionId,
        spectator: SpectatorInfo,
        code: &LobbyCode,
        password: &str,
    ) -> usize {
        let Some(lobby) = self.lobbies.get(code) else {
            return 0;
        };
        let current = lobby.spectators.len();

        if self.machine_owner.contains_key(&conn) {
            debug!(lobby = %code, connection = %conn, "machine cannot spectate, ignored");
            return current;
        }
        if !lobby.accepts_password(password) {
            return current;
        }

        self.disconnect_spectator(conn);

        let Some(lobby) = self.lobbies.get_mut(code) else {
            return 0;
        };
        lobby.spectators.insert(
            conn,
            Spectator {
                connection_id: conn,
                profile_name: spectator.profile_name,
            },
        );
        let count = lobby.spectators.len();
        let state = lobby.state();

        self.spectator_owner.insert(conn, code.clone());
        self.rooms.join(conn, code);
        self.effects
            .push(Effect::Direct(conn, ServerEvent::LobbyState(state)));

        info!(lobby = %code, connection = %conn, spectators = count, "spectator joined");
        count
    }

    /// Broadcast the current state of the caller's lobby to its room.
    pub fn request_state(&mut self, conn: ConnectionId) -> Result<(), LobbyError> {
        let code = self
            .machine_owner
            .get(&conn)
            .or_else(|| self.spectator_owner.get(&conn))
            .cloned()
            .ok_or(LobbyError::LobbyNotFound)?;
        self.broadcast_state(&code);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Remove the machine owned by `conn` without closing its transport.
    ///
    /// If no players remain in the lobby it is deleted: spectators are
    /// force-disconnected and any player-less machines are detached.
    /// Otherwise the remaining room receives fresh state. Returns false
    /// if `conn` owned no machine.
    pub fn disconnect_machine(&mut self, conn: ConnectionId) -> bool {
        let Some(code) = self.machine_owner.remove(&conn) else {
            return false;
        };
        self.rooms.leave(conn, &code);

        let Some(lobby) = self.lobbies.get_mut(&code) else {
            warn!(lobby = %code, connection = %conn, "machine owner pointed at missing lobby");
            return true;
        };
        let was_on_select = lobby.all_on_select();
        lobby.machines.shift_remove(&conn);
        info!(lobby = %code, connection = %conn, "machine left");

        if lobby.player_count() == 0 {
            self.close_lobby(&code);
        } else {
            // The leaver may have been the last player still in a song.
            if lobby.reset_round_on_return(was_on_select) {
                debug!(lobby = %code, "remaining machines on song select, round reset");
            }
            self.broadcast_state(&code);
        }
        true
    }

    /// Remove the spectator owned by `conn`. Never closes the lobby.
    pub fn disconnect_spectator(&mut self, conn: ConnectionId) -> bool {
        let Some(code) = self.spectator_owner.remove(&conn) else {
            return false;
        };
        self.rooms.leave(conn, &code);
        if let Some(lobby) = self.lobbies.get_mut(&code) {
            lobby.spectators.shift_remove(&conn);
        }
        debug!(lobby = %code, connection = %conn, "spectator left");
        true
    }

    /// Drop all lobbies, indices and pending effects.
    pub fn reset(&mut self) {
        self.lobbies.clear();
        self.machine_owner.clear();
        self.spectator_owner.clear();
        self.rooms.clear();
        self.effects.clear();
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    /// Release every role `conn` holds, machine first.
    fn release_roles(&mut self, conn: ConnectionId) {
        self.disconnect_machine(conn);
        self.disconnect_spectator(conn);
    }

    fn close_lobby(&mut self, code: &LobbyCode) {
        let Some(lobby) = self.lobbies.remove(code) else {
            return;
        };

        for id in lobby.spectators.keys().copied() {
            self.spectator_owner.remove(&id);
            self.rooms.leave(id, code);
            self.effects
                .push(Effect::Disconnect(id, Some(LOBBY_CLOSED_REASON.to_string())));
        }

        // Machines that never seated a player are not worth a lobby.
        for id in lobby.machines.keys().copied() {
            self.machine_owner.remove(&id);
            self.rooms.leave(id, code);
            self.effects
                .push(Effect::Direct(id, ServerEvent::lobby_left(true)));
        }

        info!(
            lobby = %code,
            spectators = lobby.spectators.len(),
            "lobby closed"
        );
    }

    fn broadcast_state(&mut self, code: &LobbyCode) {
        if let Some(lobby) = self.lobbies.get(code) {
            self.effects
                .push(Effect::Room(code.clone(), ServerEvent::LobbyState(lobby.state())));
        }
    }
}
