//! # Typerace
//!
//! A room server for multiplayer typing races. Browsers connect over
//! WebSocket, create or join a room, and race to type the same passage
//! while the server tracks progress, ranks finishers, and runs the clock.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use typerace::prelude::*;
//!
//! # async fn start() -> Result<(), TyperaceError> {
//! let server = TyperaceServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .quotes(QuoteSource::from_file("quotes.json"))
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::TyperaceError;
pub use server::{TyperaceServer, TyperaceServerBuilder};

pub mod prelude {
    //! The types most servers need, in one import.

    pub use crate::{TyperaceError, TyperaceServer, TyperaceServerBuilder};
    pub use typerace_protocol::{ClientMessage, ErrorCode, PlayerId, RoomId, ServerMessage};
    pub use typerace_room::{LobbyHandle, LobbyStats, QuoteSource, RaceConfig};
}
