//! Central coordinator loop.
//!
//! This task owns the `LobbySessionCoordinator` instance and processes
//! all `CoordinatorRequest`s coming from connections, one at a time.
//! Because nothing else touches lobby state, every request observes and
//! leaves the lobby invariants intact without any locking.

use lobby_core::LobbyManager;
use tracing::{debug, info};

use crate::coordinator::LobbySessionCoordinator;
use crate::types::{ClientHandle, CoordinatorRequest, CoordinatorRx};

/// Run the central coordinator processing loop.
///
/// Returns when `Shutdown` is received or every sender has been dropped.
pub async fn run_coordinator_loop(mut coordinator_rx: CoordinatorRx) {
    let mut coordinator: LobbySessionCoordinator<ClientHandle> =
        LobbySessionCoordinator::with_manager(LobbyManager::new());

    while let Some(req) = coordinator_rx.recv().await {
        match req {
            CoordinatorRequest::Connect { handle, reply } => {
                let id = coordinator.on_connect(handle);
                if reply.send(id).is_err() {
                    // Connection task gave up before learning its id.
                    coordinator.on_disconnect(id);
                }
            }
            CoordinatorRequest::Message { id, payload } => {
                coordinator.on_message(id, &payload);
            }
            CoordinatorRequest::Disconnect { id } => {
                debug!(connection = %id, "transport closed");
                coordinator.on_disconnect(id);
            }
            CoordinatorRequest::Shutdown => {
                coordinator.shutdown();
                break;
            }
        }
    }

    info!(
        lobbies = coordinator.manager().lobby_count(),
        connections = coordinator.registry().len(),
        "coordinator loop shutting down"
    );
}
