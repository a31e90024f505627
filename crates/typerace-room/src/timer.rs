//! Per-room race clocks.
//!
//! Each started room gets one countdown task. The task owns nothing but
//! its [`Countdown`]; every tick it posts a [`TimerEvent`] back to the
//! lobby, which applies it like any other input. Cancelling a timer aborts
//! its task, and any events it already posted are recognised as stale by
//! their [`TimerId`] and dropped.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use typerace_protocol::RoomId;
use typerace_tick::Countdown;

/// Identifies one arming of a race timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// What a timer task observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEventKind {
    /// One tick elapsed; `remaining` ticks are left.
    Tick { remaining: u32 },
    /// The clock reached zero. No further events follow.
    Expired,
}

/// An event posted by a timer task to the lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEvent {
    pub room_id: RoomId,
    pub timer_id: TimerId,
    pub kind: TimerEventKind,
}

struct RaceTimer {
    id: TimerId,
    task: JoinHandle<()>,
}

/// The set of running race timers, at most one per room.
pub struct RaceTimers {
    events: mpsc::UnboundedSender<TimerEvent>,
    active: HashMap<RoomId, RaceTimer>,
    next_id: u64,
}

impl RaceTimers {
    /// Creates an empty set whose tasks post into `events`.
    pub fn new(events: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            events,
            active: HashMap::new(),
            next_id: 1,
        }
    }

    /// Starts a countdown of `ticks` ticks for `room_id`, replacing any
    /// timer already running for it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn arm(&mut self, room_id: RoomId, ticks: u32, interval: Duration) -> TimerId {
        self.cancel(&room_id);

        let id = TimerId(self.next_id);
        self.next_id += 1;

        let events = self.events.clone();
        let task_room = room_id.clone();
        let task = tokio::spawn(async move {
            let mut countdown = Countdown::new(ticks, interval);
            while !countdown.is_finished() {
                let info = countdown.wait_for_tick().await;
                let kind = if info.remaining == 0 {
                    TimerEventKind::Expired
                } else {
                    TimerEventKind::Tick {
                        remaining: info.remaining,
                    }
                };
                let event = TimerEvent {
                    room_id: task_room.clone(),
                    timer_id: id,
                    kind,
                };
                if events.send(event).is_err() {
                    break;
                }
            }
        });

        tracing::debug!(%room_id, timer_id = %id, ticks, "race timer armed");
        self.active.insert(room_id, RaceTimer { id, task });
        id
    }

    /// Stops the room's timer. Returns `false` if none was running, which
    /// is not an error.
    pub fn cancel(&mut self, room_id: &RoomId) -> bool {
        match self.active.remove(room_id) {
            Some(timer) => {
                timer.task.abort();
                tracing::debug!(%room_id, timer_id = %timer.id, "race timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Whether `timer_id` is the live timer for `room_id`.
    pub fn is_current(&self, room_id: &RoomId, timer_id: TimerId) -> bool {
        self.active.get(room_id).is_some_and(|t| t.id == timer_id)
    }

    /// Forgets a timer whose task has already run out.
    pub fn retire(&mut self, room_id: &RoomId, timer_id: TimerId) {
        if self.is_current(room_id, timer_id) {
            self.active.remove(room_id);
        }
    }

    /// Whether the room has a running timer.
    pub fn is_running(&self, room_id: &RoomId) -> bool {
        self.active.contains_key(room_id)
    }

    /// Number of running timers.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Cancels every running timer.
    pub fn cancel_all(&mut self) {
        for (_, timer) in self.active.drain() {
            timer.task.abort();
        }
    }
}

impl Drop for RaceTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl fmt::Debug for RaceTimers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaceTimers")
            .field("active", &self.active.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
