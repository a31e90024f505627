//! Error types for the session layer.

use typerace_transport::ConnectionId;

/// Errors raised by [`ConnectionRegistry`](crate::ConnectionRegistry).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection was never registered, or has already been removed.
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),

    /// The connection id is already in use.
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnectionId),

    /// The connection already holds a seat; it must leave first.
    #[error("connection {0} already holds a seat")]
    AlreadySeated(ConnectionId),

    /// The connection's writer task has gone away.
    #[error("outbound channel for {0} is closed")]
    ChannelClosed(ConnectionId),
}
