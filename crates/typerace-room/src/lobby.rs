//! The lobby: every room, every connection, every race clock, and the
//! rules that tie them together.
//!
//! `Lobby` is synchronous and single-owner. The lobby actor (see
//! [`spawn_lobby`](crate::spawn_lobby)) feeds it one input at a time:
//!
//! ```text
//! connect ──→ handle_message* ──→ disconnect
//!                  │
//!                  ├─ createRoom / joinRoom / leaveRoom / startGame → Room + RoomStore
//!                  ├─ progress / finish                             → Room + RankingTracker
//!                  └─ (race start)                                  → RaceTimers
//! handle_timer ────────────────────────────────────────────────────→ timerTick / raceTimeout
//! ```
//!
//! Every outbound message goes through [`BroadcastFanout`].

use tokio::sync::mpsc;
use typerace_protocol::{ClientMessage, PlayerId, RoomId, ServerMessage};
use typerace_session::{ConnectionRegistry, ConnectionSender, Seat, SessionError};
use typerace_transport::ConnectionId;

use crate::{
    BroadcastFanout, QuoteSource, RaceConfig, RaceTimers, RankingTracker, RoomError, RoomStore,
    TimerEvent, TimerEventKind,
};

/// Owns all race state and applies client messages and timer events to it.
#[derive(Debug)]
pub struct Lobby {
    config: RaceConfig,
    quotes: QuoteSource,
    rooms: RoomStore,
    rankings: RankingTracker,
    registry: ConnectionRegistry,
    timers: RaceTimers,
    fanout: BroadcastFanout,
}

impl Lobby {
    /// Creates an empty lobby. Race timers post their events into
    /// `timer_events`; the owner must route them back to
    /// [`handle_timer`](Self::handle_timer).
    pub fn new(
        config: RaceConfig,
        quotes: QuoteSource,
        timer_events: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        Self {
            rooms: RoomStore::new(config.room_id_len),
            config,
            quotes,
            rankings: RankingTracker::new(),
            registry: ConnectionRegistry::new(),
            timers: RaceTimers::new(timer_events),
            fanout: BroadcastFanout::default(),
        }
    }

    pub fn rooms(&self) -> &RoomStore {
        &self.rooms
    }

    pub fn rankings(&self) -> &RankingTracker {
        &self.rankings
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn timers(&self) -> &RaceTimers {
        &self.timers
    }

    // -- Connection lifecycle ----------------------------------------------

    /// Registers a new connection and the channel its writer drains.
    pub fn connect(&mut self, conn: ConnectionId, sender: ConnectionSender) {
        if let Err(e) = self.registry.register(conn, sender) {
            tracing::warn!(%conn, error = %e, "duplicate connection ignored");
        }
    }

    /// Drops a connection, vacating its seat exactly as an explicit leave
    /// would (minus the `leftRoom` reply).
    pub fn disconnect(&mut self, conn: ConnectionId) {
        if let Some(seat) = self.registry.unregister(conn) {
            tracing::info!(%conn, room_id = %seat.room_id, player_id = %seat.player_id, "seated connection dropped");
            self.leave_seat(seat);
        }
    }

    // -- Client messages ---------------------------------------------------

    /// Applies one client message. Rejections the client should hear about
    /// are answered with `error{code, message}`.
    pub fn handle_message(&mut self, conn: ConnectionId, msg: ClientMessage) {
        let result = match msg {
            ClientMessage::CreateRoom { max_players } => self.create_room(conn, max_players),
            ClientMessage::JoinRoom { room_id } => self.join_room(conn, room_id),
            ClientMessage::LeaveRoom {} => {
                self.leave_room(conn);
                Ok(())
            }
            ClientMessage::Progress {
                room_id,
                player_id,
                progress,
            } => {
                self.progress(conn, &room_id, player_id, progress);
                Ok(())
            }
            ClientMessage::Finish { room_id, player_id } => {
                self.finish(conn, &room_id, player_id);
                Ok(())
            }
            ClientMessage::StartGame { room_id, player_id } => {
                self.start_game(conn, &room_id, player_id)
            }
            ClientMessage::RaceTimeout { room_id } => {
                tracing::debug!(%conn, %room_id, "client race timeout ignored");
                Ok(())
            }
        };

        if let Err(err) = result {
            match err.code() {
                Some(code) => {
                    tracing::debug!(%conn, error = %err, "request rejected");
                    self.fanout.send_to(
                        &self.registry,
                        conn,
                        &ServerMessage::Error {
                            code,
                            message: err.to_string(),
                        },
                    );
                }
                None => tracing::warn!(%conn, error = %err, "request failed"),
            }
        }
    }

    fn create_room(&mut self, conn: ConnectionId, requested: u32) -> Result<(), RoomError> {
        if !self.registry.contains(conn) {
            return Err(SessionError::UnknownConnection(conn).into());
        }
        if let Some(seat) = self.registry.seat(conn) {
            return Err(RoomError::AlreadyInRoom(seat.room_id.clone()));
        }

        let max_players = self.config.clamp_max_players(requested);
        let room_id = self.rooms.create(max_players, self.quotes.pick())?;
        tracing::info!(%room_id, max_players, %conn, "room created");

        self.fanout
            .send_to(&self.registry, conn, &ServerMessage::RoomCreated { room_id });
        Ok(())
    }

    fn join_room(&mut self, conn: ConnectionId, room_id: RoomId) -> Result<(), RoomError> {
        if !self.registry.contains(conn) {
            return Err(SessionError::UnknownConnection(conn).into());
        }
        if let Some(seat) = self.registry.seat(conn) {
            return Err(RoomError::AlreadyInRoom(seat.room_id.clone()));
        }

        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;
        let outcome = room.join(conn)?;

        let seat = Seat {
            room_id: room_id.clone(),
            player_id: outcome.player_id,
        };
        if let Err(e) = self.registry.occupy(conn, seat) {
            // Undoing the join leaves the room exactly as it was, so a room
            // that was empty before stays open and unjoined.
            room.leave(outcome.player_id);
            return Err(e.into());
        }

        tracing::info!(
            %room_id,
            player_id = %outcome.player_id,
            players = room.player_count(),
            "player joined"
        );

        let reply = ServerMessage::JoinedRoom {
            player_id: outcome.player_id,
            room_id: room_id.clone(),
            text: room.text().to_owned(),
            creator_id: outcome.creator_id,
        };
        self.fanout.send_to(&self.registry, conn, &reply);
        self.broadcast_players(&room_id);
        self.broadcast(
            &room_id,
            &ServerMessage::UpdateCreator {
                creator_id: Some(outcome.creator_id),
            },
        );

        if outcome.became_full {
            self.start_race(&room_id);
        }
        Ok(())
    }

    fn leave_room(&mut self, conn: ConnectionId) {
        let Some(seat) = self.registry.vacate(conn) else {
            tracing::debug!(%conn, "leave without a seat ignored");
            return;
        };
        self.leave_seat(seat);
        self.fanout
            .send_to(&self.registry, conn, &ServerMessage::LeftRoom {});
    }

    /// The shared tail of an explicit leave and a disconnect.
    fn leave_seat(&mut self, seat: Seat) {
        let Seat { room_id, player_id } = seat;
        let Some(room) = self.rooms.get_mut(&room_id) else {
            tracing::debug!(%room_id, %player_id, "seat in a vanished room");
            return;
        };
        let Some(outcome) = room.leave(player_id) else {
            return;
        };
        tracing::info!(%room_id, %player_id, players = room.player_count(), "player left");

        if outcome.now_empty {
            self.rooms.remove(&room_id);
            self.rankings.forget(&room_id);
            self.timers.cancel(&room_id);
            tracing::info!(%room_id, "room deleted");
            return;
        }

        if let Some(creator_id) = outcome.new_creator {
            tracing::info!(%room_id, %creator_id, "creator reassigned");
            self.broadcast(
                &room_id,
                &ServerMessage::UpdateCreator {
                    creator_id: Some(creator_id),
                },
            );
        }
        self.broadcast_players(&room_id);
        self.conclude_if_all_finished(&room_id);
    }

    fn progress(&mut self, conn: ConnectionId, room_id: &RoomId, player_id: PlayerId, progress: u32) {
        if !self.rooms.contains(room_id) {
            return;
        }
        if !self.holds_seat(conn, room_id, player_id) {
            tracing::debug!(%conn, %room_id, %player_id, "progress for a foreign seat dropped");
            return;
        }
        if let Some(room) = self.rooms.get_mut(room_id) {
            room.set_progress(player_id, progress);
        }
        self.broadcast_players(room_id);
    }

    fn finish(&mut self, conn: ConnectionId, room_id: &RoomId, player_id: PlayerId) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        if !room.is_started() {
            tracing::debug!(%conn, %room_id, %player_id, "finish before race start ignored");
            return;
        }
        if !self.holds_seat(conn, room_id, player_id) {
            tracing::debug!(%conn, %room_id, %player_id, "finish for a foreign seat dropped");
            return;
        }

        let Some(rank) = self.rankings.record_finish(room_id, player_id) else {
            tracing::debug!(%room_id, %player_id, "duplicate finish ignored");
            return;
        };
        if let Some(room) = self.rooms.get_mut(room_id) {
            room.mark_finished(player_id);
        }
        tracing::info!(%room_id, %player_id, rank, "player finished");

        self.broadcast(room_id, &ServerMessage::PlayerFinished { player_id, rank });
        if let Some(winners) = self.rankings.take_podium(room_id) {
            self.broadcast(room_id, &ServerMessage::TopWinners { winners });
        }
        self.conclude_if_all_finished(room_id);
    }

    fn start_game(
        &mut self,
        conn: ConnectionId,
        room_id: &RoomId,
        player_id: PlayerId,
    ) -> Result<(), RoomError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;
        if !self.holds_seat(conn, room_id, player_id) {
            tracing::debug!(%conn, %room_id, %player_id, "start for a foreign seat dropped");
            return Ok(());
        }
        if room.creator() != Some(player_id) {
            tracing::debug!(%room_id, %player_id, "start from non-creator ignored");
            return Ok(());
        }
        if room.is_started() {
            return Err(RoomError::AlreadyStarted(room_id.clone()));
        }
        self.start_race(room_id);
        Ok(())
    }

    // -- Race flow -----------------------------------------------------------

    /// Moves a room into the started state, announces it, and arms its
    /// clock. A no-op for a room that has already started.
    fn start_race(&mut self, room_id: &RoomId) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        if !room.start() {
            return;
        }
        tracing::info!(%room_id, players = room.player_count(), "race started");

        self.broadcast(room_id, &ServerMessage::GameStart {});
        self.timers.arm(
            room_id.clone(),
            self.config.race_ticks(),
            self.config.tick_interval,
        );
    }

    /// Ends the race once everyone still seated has finished.
    fn conclude_if_all_finished(&mut self, room_id: &RoomId) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        if !room.is_started() || !room.all_finished() {
            return;
        }
        let Some(conclusion) = self.rankings.conclude(room_id) else {
            return;
        };
        self.timers.cancel(room_id);
        tracing::info!(%room_id, "all players finished");

        self.broadcast(room_id, &ServerMessage::StopTimer {});
        if let Some(winners) = conclusion.winners {
            self.broadcast(room_id, &ServerMessage::TopWinners { winners });
        }
    }

    // -- Timer events --------------------------------------------------------

    /// Applies an event from a race timer task. Events from a cancelled or
    /// replaced timer are dropped.
    pub fn handle_timer(&mut self, event: TimerEvent) {
        let TimerEvent {
            room_id,
            timer_id,
            kind,
        } = event;
        if !self.timers.is_current(&room_id, timer_id) {
            tracing::debug!(%room_id, %timer_id, "stale timer event dropped");
            return;
        }

        match kind {
            TimerEventKind::Tick { remaining } => {
                tracing::trace!(%room_id, remaining, "race clock tick");
                self.broadcast(&room_id, &ServerMessage::TimerTick { remaining });
            }
            TimerEventKind::Expired => {
                self.timers.retire(&room_id, timer_id);
                tracing::info!(%room_id, "race timer expired");
                self.broadcast(&room_id, &ServerMessage::RaceTimeout {});
            }
        }
    }

    /// Stops every race clock. Called when the lobby shuts down.
    pub fn shutdown(&mut self) {
        let running = self.timers.len();
        self.timers.cancel_all();
        tracing::info!(rooms = self.rooms.len(), timers = running, "lobby shut down");
    }

    // -- Helpers ---------------------------------------------------------------

    fn holds_seat(&self, conn: ConnectionId, room_id: &RoomId, player_id: PlayerId) -> bool {
        self.registry
            .seat(conn)
            .is_some_and(|s| s.room_id == *room_id && s.player_id == player_id)
    }

    fn broadcast(&self, room_id: &RoomId, msg: &ServerMessage) {
        if let Some(room) = self.rooms.get(room_id) {
            self.fanout.broadcast(&self.registry, room, msg);
        }
    }

    fn broadcast_players(&self, room_id: &RoomId) {
        if let Some(room) = self.rooms.get(room_id) {
            let msg = ServerMessage::UpdatePlayers {
                players: room.player_views(),
            };
            self.fanout.broadcast(&self.registry, room, &msg);
        }
    }
}
