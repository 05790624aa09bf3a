//! Per-connection WebSocket task.
//!
//! Each accepted socket gets one reader loop (this task) and one writer
//! task fed by the connection's outbound channel. The reader forwards raw
//! frames to the coordinator; it never decodes them itself.

use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::types::{ClientHandle, CoordinatorRequest, CoordinatorTx, Outbound, OutboundRx};

/// Run the client I/O loop for a single connection.
pub async fn run_client(
    stream: TcpStream,
    peer_addr: SocketAddr,
    coordinator_tx: CoordinatorTx,
) -> Result<(), ServerError> {
    let ws_stream = accept_async(stream).await.map_err(ServerError::Handshake)?;
    let (write_half, mut read_half) = ws_stream.split();

    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (reply_tx, reply_rx) = oneshot::channel();
    coordinator_tx
        .send(CoordinatorRequest::Connect {
            handle: ClientHandle::new(out_tx),
            reply: reply_tx,
        })
        .map_err(|_| ServerError::CoordinatorClosed)?;
    let id = reply_rx.await.map_err(|_| ServerError::CoordinatorClosed)?;
    info!(connection = %id, peer = %peer_addr, "connection accepted");

    let writer = tokio::spawn(write_loop(write_half, out_rx));

    while let Some(frame) = read_half.next().await {
        let payload = match frame {
            Ok(Message::Text(text)) => text.as_bytes().to_vec(),
            Ok(Message::Binary(data)) => data.to_vec(),
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
            Err(e) => {
                debug!(connection = %id, error = %e, "read error");
                break;
            }
        };

        if coordinator_tx
            .send(CoordinatorRequest::Message { id, payload })
            .is_err()
        {
            break;
        }
    }

    // The coordinator may already be gone during shutdown.
    let _ = coordinator_tx.send(CoordinatorRequest::Disconnect { id });
    let _ = writer.await;
    Ok(())
}

async fn write_loop<S>(mut sink: S, mut out_rx: OutboundRx)
where
    S: futures::Sink<Message> + Unpin,
{
    while let Some(outbound) = out_rx.recv().await {
        match outbound {
            Outbound::Text(text) => {
                if sink.send(Message::text(text)).await.is_err() {
                    break;
                }
            }
            Outbound::Close => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        }
    }
    let _ = sink.close().await;
}
