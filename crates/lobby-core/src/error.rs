//! Error types for lobby operations.
//!
//! Every variant is a precondition failure or a consistency miss that a
//! disconnect race can legitimately produce. None of them is fatal: the
//! dispatcher turns them into a `responseStatus` for the caller, using
//! the `Display` text as the message.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyError {
    /// Unknown code or wrong password. Deliberately one variant so the
    /// caller cannot probe which codes exist.
    #[error("Unable to join lobby")]
    CannotJoin,

    #[error("Lobby is full")]
    LobbyFull,

    /// Joining or re-selecting once a round has a song.
    #[error("Song already selected")]
    SongAlreadySelected,

    /// The connection does not own a machine in any lobby.
    #[error("Machine not found")]
    MachineNotFound,

    /// The connection is not attached to any lobby.
    #[error("Lobby not found")]
    LobbyNotFound,
}
