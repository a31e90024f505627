//! Room lifecycle management for Typerace.
//!
//! All race state lives in one [`Lobby`] owned by a single Tokio task (the
//! lobby actor). Connection handlers and race timers never touch it
//! directly; they post commands and events into the actor's channels and
//! the actor applies them one at a time.
//!
//! # Key types
//!
//! - [`Lobby`]: the coordinator: routes each client message to the parts below
//! - [`LobbyHandle`]: send commands to a running lobby actor
//! - [`RoomStore`] / [`Room`]: the room table and per-room lifecycle rules
//! - [`RankingTracker`]: finish order, podium reveal, race conclusion
//! - [`RaceTimers`]: one countdown task per started room
//! - [`BroadcastFanout`]: encode once, deliver to every member
//! - [`RaceConfig`] / [`QuoteSource`]: tunables and race passages

mod config;
mod error;
mod fanout;
mod lobby;
mod manager;
mod ranking;
mod room;
mod store;
mod timer;

pub use config::{FALLBACK_PASSAGE, QuoteError, QuoteSource, RaceConfig};
pub use error::RoomError;
pub use fanout::BroadcastFanout;
pub use lobby::Lobby;
pub use manager::{LobbyCommand, LobbyHandle, LobbyStats, spawn_lobby};
pub use ranking::{Conclusion, RankingTracker};
pub use room::{JoinOutcome, LeaveOutcome, PlayerState, Room};
pub use store::RoomStore;
pub use timer::{RaceTimers, TimerEvent, TimerEventKind, TimerId};
