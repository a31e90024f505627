//! `TyperaceServer` builder and accept loop.
//!
//! Ties the layers together: the WebSocket transport hands out accepted
//! peers, each gets a task that finishes the upgrade and then runs the
//! handler, and every handler talks to the one lobby actor that owns all
//! race state. The accept loop itself never waits on a handshake.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use typerace_protocol::JsonCodec;
use typerace_room::{LobbyHandle, QuoteSource, RaceConfig, spawn_lobby};
use typerace_transport::{
    DEFAULT_HANDSHAKE_TIMEOUT, Handshake, Transport, WebSocketTransport,
};

use crate::TyperaceError;
use crate::handler::handle_connection;

/// Builder for configuring and starting a Typerace server.
///
/// # Example
///
/// ```rust,ignore
/// let server = TyperaceServer::builder()
///     .bind("0.0.0.0:3000")
///     .race_config(RaceConfig { max_players_cap: 4, ..RaceConfig::default() })
///     .build()
///     .await?;
/// server.run().await
/// ```
#[derive(Debug)]
pub struct TyperaceServerBuilder {
    bind_addr: String,
    race_config: RaceConfig,
    quotes: QuoteSource,
    handshake_timeout: Duration,
}

impl TyperaceServerBuilder {
    /// Creates a builder with default settings and the fallback passage.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            race_config: RaceConfig::default(),
            quotes: QuoteSource::fallback(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets room size cap, race length, and tick interval.
    pub fn race_config(mut self, config: RaceConfig) -> Self {
        self.race_config = config;
        self
    }

    /// Sets where race passages come from.
    pub fn quotes(mut self, quotes: QuoteSource) -> Self {
        self.quotes = quotes;
        self
    }

    /// Sets how long a new peer has to complete the WebSocket upgrade.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Binds the listener and starts the lobby actor.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn build(self) -> Result<TyperaceServer, TyperaceError> {
        let transport = WebSocketTransport::bind(&self.bind_addr)
            .await?
            .with_handshake_timeout(self.handshake_timeout);
        let lobby = spawn_lobby(self.race_config, self.quotes);
        Ok(TyperaceServer { transport, lobby })
    }
}

impl Default for TyperaceServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Typerace server.
///
/// Call [`run`](Self::run) or [`run_until`](Self::run_until) to start
/// accepting connections.
pub struct TyperaceServer {
    transport: WebSocketTransport,
    lobby: LobbyHandle,
}

impl TyperaceServer {
    /// Creates a new builder.
    pub fn builder() -> TyperaceServerBuilder {
        TyperaceServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle to the lobby actor, e.g. for querying stats.
    pub fn lobby(&self) -> LobbyHandle {
        self.lobby.clone()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), TyperaceError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves.
    ///
    /// Connections already being handled keep running; the lobby actor
    /// exits once the last of them (and every other handle) is gone.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), TyperaceError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(addr = ?self.local_addr().ok(), "Typerace server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested, no longer accepting");
                    break;
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(pending) => {
                        let lobby = self.lobby.clone();
                        tokio::spawn(async move {
                            let conn_id = pending.id();
                            let conn = match pending.complete().await {
                                Ok(conn) => conn,
                                Err(e) => {
                                    tracing::debug!(%conn_id, error = %e, "handshake failed");
                                    return;
                                }
                            };
                            if let Err(e) = handle_connection(conn, lobby, JsonCodec).await {
                                tracing::debug!(%conn_id, error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        self.transport.shutdown().await?;
        Ok(())
    }
}
