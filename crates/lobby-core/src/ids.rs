//! Identifiers: connections and lobby codes.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier for a live transport connection.
///
/// This is intentionally opaque; the connection registry guarantees
/// uniqueness for as long as it lives. It never appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Number of characters in a lobby code.
pub const LOBBY_CODE_LEN: usize = 4;

/// A lobby's identity and room key, e.g. `"QXRT"`.
///
/// Codes are case-sensitive: `"qxrt"` does not address lobby `"QXRT"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LobbyCode(String);

impl LobbyCode {
    pub fn new(code: impl Into<String>) -> Self {
        LobbyCode(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for exactly four ASCII uppercase letters.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == LOBBY_CODE_LEN && self.0.bytes().all(|b| b.is_ascii_uppercase())
    }
}

impl Borrow<str> for LobbyCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LobbyCode {
    fn from(code: &str) -> Self {
        LobbyCode(code.to_string())
    }
}

impl fmt::Display for LobbyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
