//! Errors raised by the connection and server tasks.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("websocket handshake failed: {0}")]
    Handshake(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("coordinator task is no longer running")]
    CoordinatorClosed,

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
