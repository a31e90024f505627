//! Finish order per room, and the two one-shot announcements that hang
//! off it: the podium reveal and the "everyone is done" stop signal.

use std::collections::HashMap;

use typerace_protocol::{PlayerId, RoomId};

/// How many finishers make a podium.
pub const PODIUM_SIZE: usize = 3;

#[derive(Debug, Default)]
struct RankingTable {
    order: Vec<PlayerId>,
    winners_revealed: bool,
    stop_sent: bool,
}

/// The result of concluding a race because every player finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conclusion {
    /// The podium, if it has not been revealed yet.
    pub winners: Option<Vec<PlayerId>>,
}

/// Tracks, per room, the order in which players finished.
///
/// Entries are append-only and never reordered. A room's entry is dropped
/// with [`forget`](Self::forget) when the room is deleted, so a new room
/// that happens to reuse the code starts clean.
#[derive(Debug, Default)]
pub struct RankingTracker {
    tables: HashMap<RoomId, RankingTable>,
}

impl RankingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finisher and returns their 1-based rank, or `None` if they
    /// were already recorded.
    pub fn record_finish(&mut self, room_id: &RoomId, player_id: PlayerId) -> Option<usize> {
        let table = self.tables.entry(room_id.clone()).or_default();
        if table.order.contains(&player_id) {
            return None;
        }
        table.order.push(player_id);
        Some(table.order.len())
    }

    /// Returns the first three finishers the first time the list reaches
    /// podium size, and `None` every other time.
    pub fn take_podium(&mut self, room_id: &RoomId) -> Option<Vec<PlayerId>> {
        let table = self.tables.get_mut(room_id)?;
        if table.winners_revealed || table.order.len() < PODIUM_SIZE {
            return None;
        }
        table.winners_revealed = true;
        Some(table.order[..PODIUM_SIZE].to_vec())
    }

    /// Concludes the race. Returns `None` if it was already concluded.
    ///
    /// If the podium was never revealed (fewer than three finishers), the
    /// conclusion carries whoever did finish, in order.
    pub fn conclude(&mut self, room_id: &RoomId) -> Option<Conclusion> {
        let table = self.tables.entry(room_id.clone()).or_default();
        if table.stop_sent {
            return None;
        }
        table.stop_sent = true;

        let winners = if table.winners_revealed {
            None
        } else {
            table.winners_revealed = true;
            Some(table.order.iter().take(PODIUM_SIZE).copied().collect())
        };
        Some(Conclusion { winners })
    }

    /// Finishers so far, in order.
    pub fn finishers(&self, room_id: &RoomId) -> &[PlayerId] {
        self.tables
            .get(room_id)
            .map(|t| t.order.as_slice())
            .unwrap_or_default()
    }

    /// Drops everything recorded for a room.
    pub fn forget(&mut self, room_id: &RoomId) {
        self.tables.remove(room_id);
    }
}
