//! Connection tracking for Typerace.
//!
//! Every live socket is registered here together with the channel its
//! writer task drains, and with the one seat (room + player number) it may
//! hold at a time.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← resolves a player's ConnectionId to a sender here
//!     ↕
//! Session Layer (this crate)  ← connection → outbound channel + seat
//!     ↕
//! Transport / Protocol (below)  ← ConnectionId, PlayerId, RoomId
//! ```

mod error;
mod registry;

pub use error::SessionError;
pub use registry::{ConnectionRegistry, ConnectionSender, Frame, Seat};
