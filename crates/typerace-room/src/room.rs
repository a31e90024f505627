//! A single room and the rules for moving through its lifecycle.
//!
//! ```text
//! created (empty) ──join──→ open ──full / creator start──→ started
//!        ▲                   │                              │
//!        └── last player leaves: room is deleted ◄──────────┘
//! ```
//!
//! `Room` is plain data plus checks. It never sends anything; the lobby
//! decides what to broadcast from the outcomes returned here.

use std::collections::BTreeMap;

use typerace_protocol::{PlayerId, PlayerView, RoomId};
use typerace_transport::ConnectionId;

use crate::RoomError;

/// Progress is a percentage; reports above this are clamped.
const MAX_PROGRESS: u8 = 100;

/// Server-side state for one seated player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub progress: u8,
    pub finished: bool,
    /// The connection occupying this seat. Never leaves the server.
    pub connection: ConnectionId,
}

impl PlayerState {
    fn new(connection: ConnectionId) -> Self {
        Self {
            progress: 0,
            finished: false,
            connection,
        }
    }

    /// The part of this state other players are allowed to see.
    pub fn view(&self) -> PlayerView {
        PlayerView {
            progress: self.progress,
            finished: self.finished,
        }
    }
}

/// What happened on a successful join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    /// The seat number assigned to the newcomer.
    pub player_id: PlayerId,
    /// The room's creator after the join.
    pub creator_id: PlayerId,
    /// `true` if this join filled the last seat.
    pub became_full: bool,
}

/// What happened when a player left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// The departed player's final state.
    pub removed: PlayerState,
    /// Set when the creator left and someone else took over.
    pub new_creator: Option<PlayerId>,
    /// `true` if nobody is left; the caller must delete the room.
    pub now_empty: bool,
}

/// One race room.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    players: BTreeMap<PlayerId, PlayerState>,
    max_players: u32,
    text: String,
    creator: Option<PlayerId>,
    started: bool,
}

impl Room {
    /// Creates an empty, unstarted room with no creator.
    pub fn new(id: RoomId, max_players: u32, text: String) -> Self {
        Self {
            id,
            players: BTreeMap::new(),
            max_players: max_players.max(1),
            text,
            creator: None,
            started: false,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// The passage everyone in this room types.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn max_players(&self) -> u32 {
        self.max_players
    }

    pub fn creator(&self) -> Option<PlayerId> {
        self.creator
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players as usize
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerState> {
        self.players.get(&player_id)
    }

    /// Seats a new player under the lowest free id.
    ///
    /// The first player to join becomes the creator.
    ///
    /// # Errors
    /// - [`RoomError::RoomFull`] if every seat is taken (checked first).
    /// - [`RoomError::AlreadyStarted`] if the race has begun.
    pub fn join(&mut self, connection: ConnectionId) -> Result<JoinOutcome, RoomError> {
        if self.is_full() {
            return Err(RoomError::RoomFull(self.id.clone()));
        }
        if self.started {
            return Err(RoomError::AlreadyStarted(self.id.clone()));
        }

        let player_id = self.lowest_free_id();
        self.players.insert(player_id, PlayerState::new(connection));
        let creator_id = *self.creator.get_or_insert(player_id);

        Ok(JoinOutcome {
            player_id,
            creator_id,
            became_full: self.is_full(),
        })
    }

    /// Removes a player, handing the creator role to the lowest remaining
    /// id if needed. Returns `None` if the player wasn't seated here.
    pub fn leave(&mut self, player_id: PlayerId) -> Option<LeaveOutcome> {
        let removed = self.players.remove(&player_id)?;

        let mut new_creator = None;
        if self.creator == Some(player_id) {
            self.creator = self.players.keys().next().copied();
            new_creator = self.creator;
        }

        Some(LeaveOutcome {
            removed,
            new_creator,
            now_empty: self.players.is_empty(),
        })
    }

    /// Marks the race as started. Returns `false` if it already was.
    pub fn start(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        true
    }

    /// Records a progress report, clamped to 100. Returns `false` for an
    /// unknown player.
    pub fn set_progress(&mut self, player_id: PlayerId, progress: u32) -> bool {
        match self.players.get_mut(&player_id) {
            Some(player) => {
                player.progress = progress.min(u32::from(MAX_PROGRESS)) as u8;
                true
            }
            None => false,
        }
    }

    /// Flags a player as finished. Returns `false` for an unknown player.
    pub fn mark_finished(&mut self, player_id: PlayerId) -> bool {
        match self.players.get_mut(&player_id) {
            Some(player) => {
                player.finished = true;
                true
            }
            None => false,
        }
    }

    /// `true` if the room has players and every one of them has finished.
    pub fn all_finished(&self) -> bool {
        !self.players.is_empty() && self.players.values().all(|p| p.finished)
    }

    /// The public projection of every player, keyed by id.
    pub fn player_views(&self) -> BTreeMap<PlayerId, PlayerView> {
        self.players
            .iter()
            .map(|(id, state)| (*id, state.view()))
            .collect()
    }

    /// Connections of everyone currently seated, in player-id order.
    pub fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.players.values().map(|p| p.connection)
    }

    fn lowest_free_id(&self) -> PlayerId {
        // Keys are sorted, so the first gap in 1, 2, 3, ... is the answer.
        let mut candidate = 1;
        for id in self.players.keys() {
            if id.0 != candidate {
                break;
            }
            candidate += 1;
        }
        PlayerId(candidate)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn room(max_players: u32) -> Room {
        Room::new(RoomId::new("ROOM01"), max_players, "some text".into())
    }

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    #[test]
    fn test_new_room_is_empty_unstarted_without_creator() {
        let r = room(4);
        assert!(r.is_empty());
        assert!(!r.is_started());
        assert_eq!(r.creator(), None);
        assert_eq!(r.text(), "some text");
    }

    #[test]
    fn test_zero_max_players_is_raised_to_one() {
        assert_eq!(room(0).max_players(), 1);
    }

    #[test]
    fn test_join_assigns_sequential_ids_and_first_is_creator() {
        let mut r = room(3);

        let first = r.join(conn(10)).unwrap();
        let second = r.join(conn(11)).unwrap();

        assert_eq!(first.player_id, PlayerId(1));
        assert_eq!(second.player_id, PlayerId(2));
        assert_eq!(second.creator_id, PlayerId(1));
        assert!(!second.became_full);
        assert_eq!(r.player(PlayerId(2)).unwrap().connection, conn(11));
    }

    #[test]
    fn test_join_reuses_lowest_freed_id() {
        let mut r = room(4);
        for c in 1..=3 {
            r.join(conn(c)).unwrap();
        }
        r.leave(PlayerId(2)).unwrap();
        r.leave(PlayerId(1)).unwrap();

        assert_eq!(r.join(conn(4)).unwrap().player_id, PlayerId(1));
        assert_eq!(r.join(conn(5)).unwrap().player_id, PlayerId(2));
        assert_eq!(r.join(conn(6)).unwrap().player_id, PlayerId(4));
    }

    #[test]
    fn test_join_last_seat_reports_became_full() {
        let mut r = room(2);
        r.join(conn(1)).unwrap();
        assert!(r.join(conn(2)).unwrap().became_full);
        assert!(r.is_full());
    }

    #[test]
    fn test_join_full_room_returns_room_full() {
        let mut r = room(1);
        r.join(conn(1)).unwrap();
        r.start();

        // Capacity is checked before the started flag.
        let result = r.join(conn(2));
        assert!(matches!(result, Err(RoomError::RoomFull(_))));
    }

    #[test]
    fn test_join_started_room_returns_already_started() {
        let mut r = room(4);
        r.join(conn(1)).unwrap();
        r.start();

        let result = r.join(conn(2));
        assert!(matches!(result, Err(RoomError::AlreadyStarted(_))));
        assert_eq!(r.player_count(), 1);
    }

    #[test]
    fn test_creator_leaving_hands_over_to_lowest_remaining() {
        let mut r = room(4);
        for c in 1..=3 {
            r.join(conn(c)).unwrap();
        }
        r.leave(PlayerId(2)).unwrap();

        let outcome = r.leave(PlayerId(1)).unwrap();

        assert_eq!(outcome.new_creator, Some(PlayerId(3)));
        assert_eq!(r.creator(), Some(PlayerId(3)));
        assert!(!outcome.now_empty);
    }

    #[test]
    fn test_non_creator_leaving_keeps_creator() {
        let mut r = room(4);
        r.join(conn(1)).unwrap();
        r.join(conn(2)).unwrap();

        let outcome = r.leave(PlayerId(2)).unwrap();

        assert_eq!(outcome.new_creator, None);
        assert_eq!(r.creator(), Some(PlayerId(1)));
    }

    #[test]
    fn test_last_player_leaving_empties_room() {
        let mut r = room(2);
        r.join(conn(1)).unwrap();

        let outcome = r.leave(PlayerId(1)).unwrap();

        assert!(outcome.now_empty);
        assert_eq!(outcome.new_creator, None);
        assert_eq!(r.creator(), None);
        assert_eq!(outcome.removed.connection, conn(1));
    }

    #[test]
    fn test_leave_unknown_player_returns_none() {
        let mut r = room(2);
        assert!(r.leave(PlayerId(1)).is_none());
    }

    #[test]
    fn test_start_is_one_way() {
        let mut r = room(2);
        assert!(r.start());
        assert!(!r.start());
        assert!(r.is_started());
    }

    #[test]
    fn test_progress_is_clamped_and_projected() {
        let mut r = room(2);
        r.join(conn(1)).unwrap();

        assert!(r.set_progress(PlayerId(1), 250));
        assert!(!r.set_progress(PlayerId(9), 10));

        let views = r.player_views();
        assert_eq!(
            views.get(&PlayerId(1)),
            Some(&PlayerView {
                progress: 100,
                finished: false
            })
        );
    }

    #[test]
    fn test_all_finished_requires_every_player() {
        let mut r = room(3);
        assert!(!r.all_finished(), "empty room is not finished");
        r.join(conn(1)).unwrap();
        r.join(conn(2)).unwrap();

        r.mark_finished(PlayerId(1));
        assert!(!r.all_finished());
        r.mark_finished(PlayerId(2));
        assert!(r.all_finished());
    }

    #[test]
    fn test_connections_in_player_order() {
        let mut r = room(3);
        r.join(conn(30)).unwrap();
        r.join(conn(10)).unwrap();
        let conns: Vec<_> = r.connections().collect();
        assert_eq!(conns, vec![conn(30), conn(10)]);
    }
}
