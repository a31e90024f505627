//! The connection registry: every live socket, its outbound channel, and
//! the seat it currently holds.
//!
//! Rooms only store `ConnectionId`s for their players. When the room layer
//! wants to reach a player it resolves the id here and pushes an encoded
//! frame onto that connection's channel; a per-connection writer task does
//! the actual socket write.
//!
//! # Concurrency note
//!
//! Like the rest of the room state, `ConnectionRegistry` is a plain
//! `HashMap` owned by the single lobby task. Nothing here locks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use typerace_protocol::{PlayerId, RoomId};
use typerace_transport::ConnectionId;

use crate::SessionError;

/// An encoded message ready for the wire.
///
/// Broadcasts encode once and share the same buffer across recipients, so
/// frames are reference-counted rather than copied per player.
pub type Frame = Arc<[u8]>;

/// The sending half of a connection's outbound queue.
pub type ConnectionSender = mpsc::UnboundedSender<Frame>;

/// Where a connection is sitting: which room, under which player number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub room_id: RoomId,
    pub player_id: PlayerId,
}

#[derive(Debug)]
struct Entry {
    sender: ConnectionSender,
    seat: Option<Seat>,
}

/// Tracks live connections and the single seat each may hold.
///
/// ## Lifecycle
///
/// ```text
/// register() ──→ occupy() ──→ vacate() ──→ occupy() ... ──→ unregister()
///                   │                                          │
///                   └──────────── seat returned once ──────────┘
/// ```
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: HashMap<ConnectionId, Entry>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly accepted connection with its outbound channel.
    ///
    /// # Errors
    /// [`SessionError::AlreadyRegistered`] if the id is already in use.
    pub fn register(
        &mut self,
        conn: ConnectionId,
        sender: ConnectionSender,
    ) -> Result<(), SessionError> {
        if self.entries.contains_key(&conn) {
            return Err(SessionError::AlreadyRegistered(conn));
        }
        self.entries.insert(conn, Entry { sender, seat: None });
        tracing::debug!(%conn, "connection registered");
        Ok(())
    }

    /// Records that `conn` now occupies `seat`.
    ///
    /// # Errors
    /// - [`SessionError::UnknownConnection`] if `conn` isn't registered.
    /// - [`SessionError::AlreadySeated`] if it already holds a seat.
    pub fn occupy(&mut self, conn: ConnectionId, seat: Seat) -> Result<(), SessionError> {
        let entry = self
            .entries
            .get_mut(&conn)
            .ok_or(SessionError::UnknownConnection(conn))?;
        if entry.seat.is_some() {
            return Err(SessionError::AlreadySeated(conn));
        }
        tracing::debug!(%conn, room_id = %seat.room_id, player_id = %seat.player_id, "seat occupied");
        entry.seat = Some(seat);
        Ok(())
    }

    /// Clears and returns the seat held by `conn`, if any.
    pub fn vacate(&mut self, conn: ConnectionId) -> Option<Seat> {
        self.entries.get_mut(&conn).and_then(|e| e.seat.take())
    }

    /// The seat `conn` currently holds.
    pub fn seat(&self, conn: ConnectionId) -> Option<&Seat> {
        self.entries.get(&conn).and_then(|e| e.seat.as_ref())
    }

    /// Whether `conn` is registered.
    pub fn contains(&self, conn: ConnectionId) -> bool {
        self.entries.contains_key(&conn)
    }

    /// Queues `frame` for delivery to `conn`.
    ///
    /// # Errors
    /// - [`SessionError::UnknownConnection`] if `conn` isn't registered.
    /// - [`SessionError::ChannelClosed`] if its writer task has exited.
    pub fn send(&self, conn: ConnectionId, frame: Frame) -> Result<(), SessionError> {
        let entry = self
            .entries
            .get(&conn)
            .ok_or(SessionError::UnknownConnection(conn))?;
        entry
            .sender
            .send(frame)
            .map_err(|_| SessionError::ChannelClosed(conn))
    }

    /// Removes `conn` and returns the seat it was holding.
    ///
    /// Returns `None` for an unknown connection, so a second call for the
    /// same id never yields the seat again.
    pub fn unregister(&mut self, conn: ConnectionId) -> Option<Seat> {
        let entry = self.entries.remove(&conn)?;
        tracing::debug!(%conn, "connection unregistered");
        entry.seat
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
