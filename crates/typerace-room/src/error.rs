//! Error types for the room layer.

use typerace_protocol::{ErrorCode, RoomId};
use typerace_session::SessionError;

/// Errors that can occur during room operations.
///
/// The first five are the errors a client can run into; they are
/// reported back on the originating connection as `error{code, message}`.
/// The rest are internal and only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The connection already holds a seat (in the given room).
    #[error("already in room {0}")]
    AlreadyInRoom(RoomId),

    /// The room does not exist (or was deleted when its last player left).
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// Every seat in the room is taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The race in this room is already underway.
    #[error("race in room {0} has already started")]
    AlreadyStarted(RoomId),

    /// Every room code is in use.
    #[error("no free room code, try again later")]
    NoFreeRoomId,

    /// The connection registry refused the operation.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The lobby actor has shut down.
    #[error("lobby is unavailable")]
    Unavailable,
}

impl RoomError {
    /// The wire code for errors a client should hear about, `None` for
    /// internal failures.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::AlreadyInRoom(_) => Some(ErrorCode::AlreadyInRoom),
            Self::RoomNotFound(_) => Some(ErrorCode::RoomNotFound),
            Self::RoomFull(_) => Some(ErrorCode::RoomFull),
            Self::AlreadyStarted(_) => Some(ErrorCode::AlreadyStarted),
            Self::NoFreeRoomId => Some(ErrorCode::NoFreeRoomId),
            Self::Session(_) | Self::Unavailable => None,
        }
    }
}
