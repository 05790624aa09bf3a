//! lobby-core
//!
//! Pure lobby session logic:
//! - identifiers (connections, lobby codes)
//! - data model (players, machines, spectators, lobbies)
//! - room membership index
//! - lobby store and lifecycle manager
//!
//! No networking and no wire format; see `lobby-protocol` and
//! `lobby-server` for those.

pub mod ids;
pub mod model;
pub mod messages;
pub mod rooms;
pub mod manager;
pub mod error;

pub use ids::{ConnectionId, LobbyCode, LOBBY_CODE_LEN};

pub use model::{
    Lobby,
    Machine,
    MachineInfo,
    MachineUpdate,
    Player,
    PlayerUpdate,
    SongInfo,
    Spectator,
    SpectatorInfo,
    MAX_MACHINES,
    SELECT_SCREEN,
};

pub use messages::{
    ClientDisconnected,
    ClientEvent,
    CreateLobby,
    Effect,
    JoinLobby,
    LobbyLeft,
    LobbySearched,
    LobbySpectated,
    LobbyState,
    LobbySummary,
    ResponseStatus,
    SelectSong,
    ServerEvent,
    SpectateLobby,
    UpdateMachine,
};

pub use rooms::RoomIndex;
pub use manager::{LobbyManager, LOBBY_CLOSED_REASON};
pub use error::LobbyError;
