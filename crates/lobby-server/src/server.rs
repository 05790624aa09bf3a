//! WebSocket listener and top-level server wiring.
//!
//! This module:
//! - Listens on the configured address/port.
//! - Accepts new TCP connections, dropping them once `max_clients` are
//!   active.
//! - Spawns:
//!   - a per-connection task to handle WebSocket I/O,
//!   - a single central coordinator task that owns all lobby state.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::client;
use crate::config::Config;
use crate::coordinator_task::run_coordinator_loop;
use crate::error::ServerError;
use crate::types::{CoordinatorRequest, CoordinatorRx, CoordinatorTx};

/// Bind the configured address.
pub async fn bind(config: &Config) -> Result<TcpListener, ServerError> {
    let addr = config.socket_addr_string();
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Bind and serve until Ctrl-C.
pub async fn run(config: Config) -> Result<(), ServerError> {
    let listener = bind(&config).await?;
    serve(listener, config.max_clients, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// On shutdown every connected client receives `clientDisconnected`
/// before the coordinator stops.
pub async fn serve<F>(
    listener: TcpListener,
    max_clients: usize,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()>,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, max_clients, "listening");
    }

    let (coordinator_tx, coordinator_rx): (CoordinatorTx, CoordinatorRx) =
        mpsc::unbounded_channel();
    let coordinator = tokio::spawn(run_coordinator_loop(coordinator_rx));

    let active = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer_addr) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                };

                if active.load(Ordering::Acquire) >= max_clients {
                    warn!(peer = %peer_addr, max_clients, "rejecting connection: max_clients reached");
                    drop(stream);
                    continue;
                }
                active.fetch_add(1, Ordering::AcqRel);

                let coordinator_tx = coordinator_tx.clone();
                let active = Arc::clone(&active);
                tokio::spawn(async move {
                    if let Err(e) = client::run_client(stream, peer_addr, coordinator_tx).await {
                        warn!(peer = %peer_addr, error = %e, "connection ended with error");
                    }
                    active.fetch_sub(1, Ordering::AcqRel);
                });
            }
        }
    }

    let _ = coordinator_tx.send(CoordinatorRequest::Shutdown);
    drop(coordinator_tx);
    if let Err(e) = coordinator.await {
        warn!(error = %e, "coordinator task failed");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "unable to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
}
