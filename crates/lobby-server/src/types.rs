//! Shared types for the lobby server.
//!
//! This module defines:
//! - `Outbound`: what the coordinator hands a connection's writer task
//! - `ClientHandle`: the transport handle registered for each connection
//! - `CoordinatorRequest`: messages flowing from connections to the
//!   coordinator task, plus the channel aliases for both directions

use lobby_core::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::registry::Transport;

/// A frame queued for a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// One envelope as a text frame.
    Text(String),

    /// Send a close frame and stop writing.
    Close,
}

/// Outbound frames from the coordinator to a given connection.
pub type OutboundTx = mpsc::UnboundedSender<Outbound>;
pub type OutboundRx = mpsc::UnboundedReceiver<Outbound>;

/// Transport handle for one WebSocket connection.
///
/// Sending never blocks: frames are queued on the writer task's channel.
/// The handle counts as open until that task has gone away.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    tx: OutboundTx,
}

impl ClientHandle {
    pub fn new(tx: OutboundTx) -> Self {
        ClientHandle { tx }
    }
}

impl Transport for ClientHandle {
    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send_text(&self, text: &str) -> bool {
        self.tx.send(Outbound::Text(text.to_string())).is_ok()
    }

    fn close(&self) {
        let _ = self.tx.send(Outbound::Close);
    }

    fn same_transport(&self, other: &Self) -> bool {
        self.tx.same_channel(&other.tx)
    }
}

/// Message flowing from a connection task into the coordinator task.
#[derive(Debug)]
pub enum CoordinatorRequest {
    /// Register a new connection; the assigned id is sent back on `reply`.
    Connect {
        handle: ClientHandle,
        reply: oneshot::Sender<ConnectionId>,
    },

    /// One inbound frame, not yet decoded.
    Message { id: ConnectionId, payload: Vec<u8> },

    /// The transport closed or failed.
    Disconnect { id: ConnectionId },

    /// Notify everyone and stop the coordinator loop.
    Shutdown,
}

/// Channel from connections → coordinator task.
pub type CoordinatorTx = mpsc::UnboundedSender<CoordinatorRequest>;
pub type CoordinatorRx = mpsc::UnboundedReceiver<CoordinatorRequest>;
