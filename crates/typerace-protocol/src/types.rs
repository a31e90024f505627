//! Core protocol types for Typerace's wire format.
//!
//! Every type here is what actually goes over the socket. Both directions
//! use internally tagged JSON with camelCase names, matching what the
//! browser client builds with `JSON.stringify({ type: "...", ... })`.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's seat number inside one room.
///
/// Always a positive integer; the room hands out the lowest free number on
/// each join, so ids are reused after a player leaves.
///
/// `#[serde(transparent)]` keeps it a plain number on the wire (`3`, not
/// `{"0":3}`), and JSON turns it into a string when it is an object key.
/// Deserialization accepts both forms because serde buffers map keys of
/// internally tagged enums as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_any(LenientU32Visitor("a player id"))
            .map(PlayerId)
    }
}

/// Reads a `u32` written either as a JSON number or as a numeric string.
///
/// Browser clients often forward `<input>.value` untouched, which is a
/// string even for `type="number"` inputs.
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    deserializer.deserialize_any(LenientU32Visitor("a count"))
}

struct LenientU32Visitor(&'static str);

impl Visitor<'_> for LenientU32Visitor {
    type Value = u32;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as a number or numeric string", self.0)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
        u32::try_from(v).map_err(|_| E::custom(format!("{} {v} out of range", self.0)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u32, E> {
        u32::try_from(v).map_err(|_| E::custom(format!("{} {v} out of range", self.0)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u32, E> {
        v.trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid {} {v:?}", self.0)))
    }
}

/// A short, human-typeable room code such as `AB12CD`.
///
/// Unique among open rooms only: once a room is deleted its code may be
/// handed out again.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps a room code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Borrows the room code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Player projection
// ---------------------------------------------------------------------------

/// What other racers may see about a player.
///
/// This is the serializable projection of the server's player state; the
/// connection handle the server keeps alongside it has no field here, so it
/// cannot leak into a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Completion percentage, 0–100.
    pub progress: u8,
    /// Whether the player has typed the whole passage.
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// Errors reported to clients
// ---------------------------------------------------------------------------

/// Machine-readable reason attached to an `error` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    AlreadyInRoom,
    RoomNotFound,
    RoomFull,
    AlreadyStarted,
    /// Every room code is taken; only reachable with very short codes.
    NoFreeRoomId,
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Everything a browser may send.
///
/// Unknown `type` values fail to decode; the connection handler logs and
/// drops them instead of closing the socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Open a new room. The sender is not seated until it joins.
    CreateRoom {
        #[serde(deserialize_with = "lenient_u32")]
        max_players: u32,
    },

    /// Take a seat in an existing room.
    JoinRoom { room_id: RoomId },

    /// Give up the current seat.
    LeaveRoom {},

    /// Report typing progress as a percentage.
    Progress {
        room_id: RoomId,
        player_id: PlayerId,
        progress: u32,
    },

    /// Report that the whole passage has been typed.
    Finish { room_id: RoomId, player_id: PlayerId },

    /// Creator asks to start the race before the room is full.
    StartGame { room_id: RoomId, player_id: PlayerId },

    /// The client's own countdown ran out. Informational only; the
    /// server's race timer is authoritative.
    RaceTimeout { room_id: RoomId },
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Everything the server may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Reply to `createRoom`.
    RoomCreated { room_id: RoomId },

    /// Reply to a successful `joinRoom`.
    JoinedRoom {
        player_id: PlayerId,
        room_id: RoomId,
        text: String,
        creator_id: PlayerId,
    },

    /// Reply to `leaveRoom`.
    LeftRoom {},

    /// Current membership and progress of the room, keyed by player id.
    UpdatePlayers { players: BTreeMap<PlayerId, PlayerView> },

    /// The room's creator; `null` only transiently for an emptied room.
    UpdateCreator { creator_id: Option<PlayerId> },

    /// The race has begun.
    GameStart {},

    /// Seconds (ticks) left on the race clock.
    TimerTick { remaining: u32 },

    /// A player finished, with their 1-based rank.
    PlayerFinished { player_id: PlayerId, rank: usize },

    /// The podium, at most three ids in finishing order.
    TopWinners { winners: Vec<PlayerId> },

    /// The race clock ran out.
    RaceTimeout {},

    /// Everyone finished; clients stop their clocks.
    StopTimer {},

    /// A request was rejected.
    Error { code: ErrorCode, message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The browser client reads these shapes directly, so the tests pin
    //! the exact JSON rather than round-tripping.

    use super::*;
    use serde_json::json;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&PlayerId(4)).unwrap(), "4");
    }

    #[test]
    fn test_player_id_accepts_numeric_string() {
        let pid: PlayerId = serde_json::from_str(r#""12""#).unwrap();
        assert_eq!(pid, PlayerId(12));
        assert!(serde_json::from_str::<PlayerId>("-1").is_err());
    }

    #[test]
    fn test_ids_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
        assert_eq!(RoomId::new("AB12CD").to_string(), "AB12CD");
    }

    #[test]
    fn test_client_create_room_from_browser_json() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"createRoom","maxPlayers":4}"#).unwrap();
        assert_eq!(msg, ClientMessage::CreateRoom { max_players: 4 });
    }

    #[test]
    fn test_client_create_room_accepts_string_size() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"createRoom","maxPlayers":"4"}"#).unwrap();
        assert_eq!(msg, ClientMessage::CreateRoom { max_players: 4 });

        let bad = r#"{"type":"createRoom","maxPlayers":"four"}"#;
        assert!(serde_json::from_str::<ClientMessage>(bad).is_err());
    }

    #[test]
    fn test_client_progress_from_browser_json() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"progress","roomId":"QWERTY","playerId":2,"progress":57}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Progress {
                room_id: RoomId::new("QWERTY"),
                player_id: PlayerId(2),
                progress: 57,
            }
        );
    }

    #[test]
    fn test_client_leave_room_has_no_fields() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"leaveRoom"}"#).unwrap();
        assert_eq!(msg, ClientMessage::LeaveRoom {});
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "type": "leaveRoom" })
        );
    }

    #[test]
    fn test_client_extra_fields_are_tolerated() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"leaveRoom","roomId":"AB12CD"}"#).unwrap();
        assert_eq!(msg, ClientMessage::LeaveRoom {});
    }

    #[test]
    fn test_client_unknown_type_is_rejected() {
        let result: Result<ClientMessage, _> =
            serde_json::from_str(r#"{"type":"flyToMoon","speed":9000}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_client_missing_field_is_rejected() {
        let result: Result<ClientMessage, _> = serde_json::from_str(r#"{"type":"joinRoom"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_joined_room_json_shape() {
        let msg = ServerMessage::JoinedRoom {
            player_id: PlayerId(2),
            room_id: RoomId::new("AB12CD"),
            text: "hello world".into(),
            creator_id: PlayerId(1),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "joinedRoom",
                "playerId": 2,
                "roomId": "AB12CD",
                "text": "hello world",
                "creatorId": 1,
            })
        );
    }

    #[test]
    fn test_update_players_is_keyed_by_player_id() {
        let mut players = BTreeMap::new();
        players.insert(PlayerId(1), PlayerView { progress: 40, finished: false });
        players.insert(PlayerId(3), PlayerView { progress: 100, finished: true });

        let value = serde_json::to_value(&ServerMessage::UpdatePlayers { players }).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "updatePlayers",
                "players": {
                    "1": { "progress": 40, "finished": false },
                    "3": { "progress": 100, "finished": true },
                }
            })
        );
    }

    #[test]
    fn test_update_players_parses_string_keys_back() {
        let msg: ServerMessage = serde_json::from_str(
            r#"{"type":"updatePlayers","players":{"2":{"progress":5,"finished":false}}}"#,
        )
        .unwrap();
        let ServerMessage::UpdatePlayers { players } = msg else {
            panic!("wrong variant");
        };
        assert_eq!(players[&PlayerId(2)].progress, 5);
    }

    #[test]
    fn test_update_creator_none_is_null() {
        let value =
            serde_json::to_value(&ServerMessage::UpdateCreator { creator_id: None }).unwrap();
        assert_eq!(value, json!({ "type": "updateCreator", "creatorId": null }));
    }

    #[test]
    fn test_signal_messages_are_bare_objects() {
        for (msg, tag) in [
            (ServerMessage::GameStart {}, "gameStart"),
            (ServerMessage::LeftRoom {}, "leftRoom"),
            (ServerMessage::RaceTimeout {}, "raceTimeout"),
            (ServerMessage::StopTimer {}, "stopTimer"),
        ] {
            assert_eq!(serde_json::to_value(&msg).unwrap(), json!({ "type": tag }));
        }
    }

    #[test]
    fn test_top_winners_keeps_order() {
        let msg = ServerMessage::TopWinners {
            winners: vec![PlayerId(3), PlayerId(1), PlayerId(4)],
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "type": "topWinners", "winners": [3, 1, 4] })
        );
    }

    #[test]
    fn test_error_json_shape() {
        let msg = ServerMessage::Error {
            code: ErrorCode::RoomFull,
            message: "room AB12CD is full".into(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "type": "error", "code": "roomFull", "message": "room AB12CD is full" })
        );
    }
}
