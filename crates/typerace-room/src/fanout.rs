//! Delivery of server messages to room members.

use std::sync::Arc;

use typerace_protocol::{Codec, JsonCodec, ServerMessage};
use typerace_session::{ConnectionRegistry, Frame};
use typerace_transport::ConnectionId;

use crate::Room;

/// Encodes messages and pushes them onto connection channels.
///
/// A broadcast is encoded exactly once and the same bytes go to every
/// member. A member whose channel is gone gets a `warn` and is skipped;
/// the rest still receive the message and nothing is retried.
#[derive(Debug, Clone, Default)]
pub struct BroadcastFanout<C: Codec = JsonCodec> {
    codec: C,
}

impl<C: Codec> BroadcastFanout<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Sends `msg` to everyone seated in `room`.
    pub fn broadcast(&self, registry: &ConnectionRegistry, room: &Room, msg: &ServerMessage) {
        let Some(frame) = self.encode(msg) else {
            return;
        };
        for conn in room.connections() {
            if let Err(e) = registry.send(conn, frame.clone()) {
                tracing::warn!(room_id = %room.id(), %conn, error = %e, "broadcast send failed");
            }
        }
    }

    /// Sends `msg` to a single connection.
    pub fn send_to(&self, registry: &ConnectionRegistry, conn: ConnectionId, msg: &ServerMessage) {
        let Some(frame) = self.encode(msg) else {
            return;
        };
        if let Err(e) = registry.send(conn, frame) {
            tracing::warn!(%conn, error = %e, "reply send failed");
        }
    }

    fn encode(&self, msg: &ServerMessage) -> Option<Frame> {
        match self.codec.encode(msg) {
            Ok(bytes) => Some(Arc::from(bytes)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode server message");
                None
            }
        }
    }
}
