//! lobby-server
//!
//! WebSocket session coordinator for multiplayer rhythm-game lobbies.

pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod registry;
pub mod server;
pub mod types;

// these are internal modules, not re-exported
mod client;
mod coordinator_task;

pub use config::{Config, ConfigError};
pub use coordinator::{LobbySessionCoordinator, SHUTDOWN_REASON};
pub use error::ServerError;
pub use registry::{ConnectionRegistry, Transport};
