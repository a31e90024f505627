//! Unified error type for the Typerace server.

use typerace_room::RoomError;
use typerace_transport::TransportError;

/// Top-level error for building and running the server.
///
/// Malformed frames never surface here: the handler drops them. Lobby
/// rejections go back to the client as `error` messages, so `Room` only
/// carries the actor going away.
#[derive(Debug, thiserror::Error)]
pub enum TyperaceError {
    /// A transport-level error (bind, accept, handshake, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A room-level error, including the lobby actor going away.
    #[error(transparent)]
    Room(#[from] RoomError),
}
