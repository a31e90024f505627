//! Wire protocol for Typerace.
//!
//! This crate defines what browsers and the server say to each other:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`PlayerId`],
//!   [`RoomId`], [`PlayerView`]): JSON objects discriminated by a `type`
//!   field, one closed enum per direction.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   turned into bytes and back.
//! - **Errors** ([`ProtocolError`]).
//!
//! It knows nothing about sockets or rooms.
//!
//! ```text
//! Transport (frames) → Protocol (ClientMessage) → Room (Lobby)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientMessage, ErrorCode, PlayerId, PlayerView, RoomId, ServerMessage};
