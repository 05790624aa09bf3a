//! The lobby session coordinator.
//!
//! Bundles the [`LobbyManager`] with the [`ConnectionRegistry`] and
//! exposes the three calls a transport makes:
//!
//! - [`on_connect`](LobbySessionCoordinator::on_connect)
//! - [`on_message`](LobbySessionCoordinator::on_message)
//! - [`on_disconnect`](LobbySessionCoordinator::on_disconnect)
//!
//! Each call runs to completion before the next: the direct reply (if
//! any) is sent first, then every effect the manager recorded is applied
//! through the registry.

use lobby_core::{ConnectionId, Effect, LobbyManager, ServerEvent};
use lobby_protocol::decode_client_event;
use tracing::{debug, warn};

use crate::dispatcher;
use crate::registry::{ConnectionRegistry, Transport};

/// Reason sent to every connection when the server stops.
pub const SHUTDOWN_REASON: &str = "Server shutting down";

#[derive(Debug)]
pub struct LobbySessionCoordinator<T> {
    manager: LobbyManager,
    registry: ConnectionRegistry<T>,
}

impl<T: Transport> Default for LobbySessionCoordinator<T> {
    fn default() -> Self {
        LobbySessionCoordinator::with_manager(LobbyManager::new())
    }
}

impl<T: Transport> LobbySessionCoordinator<T> {
    pub fn new() -> Self {
        LobbySessionCoordinator::default()
    }

    pub fn with_manager(manager: LobbyManager) -> Self {
        LobbySessionCoordinator {
            manager,
            registry: ConnectionRegistry::new(),
        }
    }

    pub fn manager(&self) -> &LobbyManager {
        &self.manager
    }

    pub fn registry(&self) -> &ConnectionRegistry<T> {
        &self.registry
    }

    pub fn on_connect(&mut self, handle: T) -> ConnectionId {
        self.registry.connect(handle)
    }

    /// Decode and handle one inbound frame.
    ///
    /// Frames that do not decode are logged and dropped; the connection
    /// stays up.
    pub fn on_message(&mut self, id: ConnectionId, payload: &[u8]) {
        if !self.registry.contains(id) {
            warn!(connection = %id, "message from unregistered connection dropped");
            return;
        }

        let event = match decode_client_event(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(connection = %id, error = %e, "dropping inbound message");
                return;
            }
        };

        if let Some(reply) = dispatcher::dispatch(&mut self.manager, id, event) {
            self.registry.send_direct(id, &reply);
        }
        self.apply_effects();
    }

    /// Run the teardown for whatever role `id` held, then forget it.
    pub fn on_disconnect(&mut self, id: ConnectionId) {
        if self.manager.machine_lobby(id).is_some() {
            self.manager.disconnect_machine(id);
        } else if self.manager.spectator_lobby(id).is_some() {
            self.manager.disconnect_spectator(id);
        }
        self.apply_effects();
        self.registry.disconnect(id, None);
    }

    /// Tell every connection the server is going away.
    pub fn shutdown(&mut self) {
        let notified = self
            .registry
            .send_broadcast(&ServerEvent::client_disconnected(Some(SHUTDOWN_REASON.to_string())));
        debug!(notified, "shutdown broadcast sent");
    }

    /// Forget all lobbies and connections.
    pub fn reset(&mut self) {
        self.manager.reset();
        self.registry.clear();
    }

    fn apply_effects(&mut self) {
        for effect in self.manager.take_effects() {
            match effect {
                Effect::Direct(id, event) => {
                    self.registry.send_direct(id, &event);
                }
                Effect::Room(code, event) => {
                    self.registry.send_room(&event, &code, self.manager.rooms());
                }
                Effect::Disconnect(id, reason) => {
                    debug!(connection = %id, "closing connection on lobby teardown");
                    self.registry.disconnect(id, reason);
                }
            }
        }
    }
}
