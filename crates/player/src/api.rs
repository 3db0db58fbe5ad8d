use serde::{Deserialize, Serialize};

use crate::drag::Handle;
use crate::trim::TrimRange;

/// One item from the external video listing. Immutable once received and
/// replaced wholesale when the user picks a different item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSelection {
    pub id: String,
    pub title: String,
}

/// Synchronizer phases, leaf to root of the playback lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No engine instance exists yet.
    Idle,
    /// Engine bootstrap requested, readiness not reported.
    Initializing,
    /// Engine ready, nothing cued.
    ReadyNoMedia,
    /// Media cued, duration not yet resolved.
    Loading,
    ReadyPaused,
    ReadyPlaying,
    /// Torn down; every later command and notification is ignored.
    Destroyed,
}

/// Commands accepted by the synchronizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Switches playback to a different listing item.
    Select(VideoSelection),
    Play,
    Pause,
    Seek {
        seconds: f64,
    },
    /// Periodic time poll while playing; issued by the driver on a fixed
    /// interval whenever [`Event::PollStarted`] is outstanding.
    PollTick,
    /// Deferred duration re-check scheduled via [`Event::ProbeScheduled`].
    /// Probes carrying a stale `generation` are discarded.
    ProbeDuration {
        generation: u64,
    },
    BeginDrag(Handle),
    DragMoved {
        x: f32,
        track_width: f32,
    },
    EndDrag,
    Teardown,
}

/// Events emitted by the synchronizer toward its driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SnapshotChanged(PlayerSnapshot),
    /// The driver must arm the fixed-interval time poll.
    PollStarted,
    /// The driver must cancel the time poll.
    PollStopped,
    /// The driver must deliver `ProbeDuration { generation }` after the probe
    /// interval elapses.
    ProbeScheduled { generation: u64, attempt: u32 },
}

/// Immutable view of the playback state consumed by the UI. One source of
/// truth per field; the UI keeps no shadow copies.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub phase: Phase,
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub trim: TrimRange,
    pub duration_seconds: f64,
    pub current_time_seconds: f64,
    pub engine_ready: bool,
    pub video_loading: bool,
    pub is_playing: bool,
    pub drag_active: Option<Handle>,
}

impl PlayerSnapshot {
    /// Snapshot for a synchronizer that has not started bootstrapping.
    pub fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            video_id: None,
            title: None,
            trim: TrimRange::FULL,
            duration_seconds: 0.0,
            current_time_seconds: 0.0,
            engine_ready: false,
            video_loading: false,
            is_playing: false,
            drag_active: None,
        }
    }
}
