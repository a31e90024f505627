//! Per-connection handler: register with the lobby, pump frames both ways.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register the connection and its outbound channel with the lobby
//!   2. Spawn a writer that drains the channel into the socket
//!   3. Loop: receive frames → decode `ClientMessage` → forward to the lobby
//!   4. On exit, the drop guard tells the lobby the connection is gone

use std::sync::Arc;

use tokio::sync::mpsc;
use typerace_protocol::{ClientMessage, Codec};
use typerace_room::LobbyHandle;
use typerace_session::Frame;
use typerace_transport::{Connection, ConnectionId, WebSocketConnection};

use crate::TyperaceError;

/// Drop guard that reports the disconnect when the handler exits.
///
/// Runs on every exit path, including errors and panics. The lobby
/// channel is unbounded, so posting from `Drop` needs no runtime.
struct DisconnectGuard {
    conn_id: ConnectionId,
    lobby: LobbyHandle,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let _ = self.lobby.disconnect(self.conn_id);
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    lobby: LobbyHandle,
    codec: C,
) -> Result<(), TyperaceError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();
    lobby.connect(conn_id, tx)?;
    let _guard = DisconnectGuard {
        conn_id,
        lobby: lobby.clone(),
    };

    let writer = {
        let conn = Arc::clone(&conn);
        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(e) = conn.send(&frame).await {
                    tracing::debug!(%conn_id, error = %e, "write failed, stopping writer");
                    break;
                }
            }
        })
    };

    let result = read_loop(&conn, &lobby, &codec).await;
    writer.abort();
    result
}

async fn read_loop<C: Codec>(
    conn: &WebSocketConnection,
    lobby: &LobbyHandle,
    codec: &C,
) -> Result<(), TyperaceError> {
    let conn_id = conn.id();
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let msg: ClientMessage = match codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "malformed message dropped");
                continue;
            }
        };

        lobby.send_message(conn_id, msg)?;
    }
}
