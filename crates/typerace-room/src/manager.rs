//! The lobby actor: a single Tokio task that owns the [`Lobby`] and
//! applies commands and timer events to it in arrival order.
//!
//! Connection handlers talk to it through a cloneable [`LobbyHandle`].

use tokio::sync::{mpsc, oneshot};
use typerace_protocol::ClientMessage;
use typerace_session::ConnectionSender;
use typerace_transport::ConnectionId;

use crate::{Lobby, QuoteSource, RaceConfig, RoomError, TimerEvent};

/// Commands sent to the lobby actor through its channel.
///
/// The channel is unbounded so that a connection's drop guard can post
/// `Disconnected` synchronously.
#[derive(Debug)]
pub enum LobbyCommand {
    /// A connection was accepted; frames for it go into `sender`.
    Connected {
        conn: ConnectionId,
        sender: ConnectionSender,
    },

    /// A decoded message from a connection.
    Message {
        conn: ConnectionId,
        msg: ClientMessage,
    },

    /// The connection is gone.
    Disconnected { conn: ConnectionId },

    /// Request a snapshot of lobby counters.
    Stats { reply: oneshot::Sender<LobbyStats> },
}

/// Lobby counters, mostly useful in tests and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LobbyStats {
    /// Open rooms.
    pub rooms: usize,
    /// Registered connections.
    pub connections: usize,
    /// Race clocks currently running.
    pub timers: usize,
}

/// Handle to a running lobby actor.
///
/// Cheap to clone. When the last handle is dropped the actor shuts down
/// and cancels every race clock.
#[derive(Debug, Clone)]
pub struct LobbyHandle {
    sender: mpsc::UnboundedSender<LobbyCommand>,
}

impl LobbyHandle {
    /// Registers a connection and the channel its writer drains.
    pub fn connect(&self, conn: ConnectionId, sender: ConnectionSender) -> Result<(), RoomError> {
        self.send(LobbyCommand::Connected { conn, sender })
    }

    /// Forwards a client message.
    pub fn send_message(&self, conn: ConnectionId, msg: ClientMessage) -> Result<(), RoomError> {
        self.send(LobbyCommand::Message { conn, msg })
    }

    /// Reports that a connection closed.
    pub fn disconnect(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.send(LobbyCommand::Disconnected { conn })
    }

    /// Asks the actor for its current counters.
    pub async fn stats(&self) -> Result<LobbyStats, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(LobbyCommand::Stats { reply: reply_tx })?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    fn send(&self, cmd: LobbyCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).map_err(|_| RoomError::Unavailable)
    }
}

struct LobbyActor {
    lobby: Lobby,
    commands: mpsc::UnboundedReceiver<LobbyCommand>,
    timer_events: mpsc::UnboundedReceiver<TimerEvent>,
}

impl LobbyActor {
    /// Runs until every [`LobbyHandle`] has been dropped.
    async fn run(mut self) {
        tracing::info!("lobby actor started");

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                Some(event) = self.timer_events.recv() => {
                    self.lobby.handle_timer(event);
                }
            }
        }

        self.lobby.shutdown();
        tracing::info!("lobby actor stopped");
    }

    fn handle_command(&mut self, cmd: LobbyCommand) {
        match cmd {
            LobbyCommand::Connected { conn, sender } => self.lobby.connect(conn, sender),
            LobbyCommand::Message { conn, msg } => self.lobby.handle_message(conn, msg),
            LobbyCommand::Disconnected { conn } => self.lobby.disconnect(conn),
            LobbyCommand::Stats { reply } => {
                let _ = reply.send(LobbyStats {
                    rooms: self.lobby.rooms().len(),
                    connections: self.lobby.registry().len(),
                    timers: self.lobby.timers().len(),
                });
            }
        }
    }
}

/// Spawns the lobby actor and returns a handle to it.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_lobby(config: RaceConfig, quotes: QuoteSource) -> LobbyHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (timer_tx, timer_rx) = mpsc::unbounded_channel();

    let actor = LobbyActor {
        lobby: Lobby::new(config, quotes, timer_tx),
        commands: cmd_rx,
        timer_events: timer_rx,
    };
    tokio::spawn(actor.run());

    LobbyHandle { sender: cmd_tx }
}
