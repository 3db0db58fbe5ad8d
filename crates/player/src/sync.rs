use tracing::{debug, info, warn};

use crate::adapter::{EngineAdapter, EngineState, PlaybackEngine};
use crate::api::{Command, Event, Phase, PlayerSnapshot, VideoSelection};
use crate::drag::DragController;
use crate::store::TrimStore;
use crate::trim::TrimRange;

/// Fixed interval between time polls while playing.
pub const POLL_INTERVAL_MS: u64 = 200;
/// Fixed interval between duration probes while a cue is resolving.
pub const PROBE_INTERVAL_MS: u64 = 100;
/// Bounded retry budget for duration probing; exhaustion degrades to a
/// persistent loading state, never a hard error.
pub const MAX_DURATION_PROBES: u32 = 50;

/// State machine reconciling selection changes, engine readiness, periodic
/// time polling, and trim-boundary enforcement.
///
/// All timing is externalized: the driver arms the poll on
/// [`Event::PollStarted`], cancels it on [`Event::PollStopped`], and turns
/// each [`Event::ProbeScheduled`] into one deferred
/// [`Command::ProbeDuration`]. Tests drive ticks directly, so no wall clock
/// is read here.
///
/// Boundary enforcement runs on every poll tick except while a drag gesture
/// is active, regardless of the engine-reported playback state.
#[derive(Debug)]
pub struct Synchronizer<E> {
    adapter: EngineAdapter<E>,
    store: TrimStore,
    drag: DragController,
    phase: Phase,
    selected: Option<VideoSelection>,
    trim: TrimRange,
    duration_seconds: f64,
    current_time_seconds: f64,
    polling: bool,
    /// Bumped on every selection change; stale probe chains carry the old
    /// value and are discarded.
    load_generation: u64,
    probe_attempt: u32,
}

impl<E> Synchronizer<E>
where
    E: PlaybackEngine,
{
    pub fn new(store: TrimStore) -> Self {
        Self {
            adapter: EngineAdapter::new(),
            store,
            drag: DragController::new(),
            phase: Phase::Idle,
            selected: None,
            trim: TrimRange::FULL,
            duration_seconds: 0.0,
            current_time_seconds: 0.0,
            polling: false,
            load_generation: 0,
            probe_attempt: 0,
        }
    }

    /// Marks the beginning of engine bootstrap. Called once by the driver
    /// right after it requests the process-wide loader.
    pub fn start(&mut self) -> Vec<Event> {
        if self.phase != Phase::Idle {
            return Vec::new();
        }
        self.phase = Phase::Initializing;
        vec![self.snapshot_event()]
    }

    /// Installs the engine instance produced by the asynchronous bootstrap.
    /// The instance stays unusable until [`Self::engine_ready`].
    pub fn attach_engine(&mut self, instance: E) {
        if self.phase == Phase::Destroyed {
            debug!("engine instance discarded: synchronizer is destroyed");
            return;
        }
        self.adapter.attach(instance);
    }

    /// Handles the engine's ready notification. Tolerates arriving after
    /// multiple selection changes: only the latest selection is cued.
    pub fn engine_ready(&mut self) -> Vec<Event> {
        if self.phase == Phase::Destroyed {
            return Vec::new();
        }
        self.adapter.mark_ready();
        if !self.adapter.is_ready() {
            return Vec::new();
        }

        if self.selected.is_some() {
            info!("engine ready with pending selection, resolving duration");
            self.enter_loading()
        } else {
            self.phase = Phase::ReadyNoMedia;
            vec![self.snapshot_event()]
        }
    }

    /// Handles one engine state-change notification carrying the external
    /// numeric code.
    pub fn engine_state_changed(&mut self, code: i32) -> Vec<Event> {
        if self.phase == Phase::Destroyed {
            return Vec::new();
        }

        match EngineState::from_code(code) {
            EngineState::Paused | EngineState::Ended if self.phase == Phase::ReadyPlaying => {
                let mut events = Vec::new();
                self.stop_polling(&mut events);
                self.phase = Phase::ReadyPaused;
                self.current_time_seconds = self.adapter.current_time();
                events.push(self.snapshot_event());
                events
            }
            EngineState::Playing if self.phase == Phase::ReadyPaused => {
                let mut events = Vec::new();
                self.phase = Phase::ReadyPlaying;
                self.start_polling(&mut events);
                events.push(self.snapshot_event());
                events
            }
            state => {
                debug!(?state, phase = ?self.phase, "engine state change without transition");
                Vec::new()
            }
        }
    }

    /// Applies one command and returns emitted events. Commands arriving
    /// after teardown are ignored.
    pub fn handle_command(&mut self, command: Command) -> Vec<Event> {
        if self.phase == Phase::Destroyed && command != Command::Teardown {
            return Vec::new();
        }

        match command {
            Command::Select(selection) => self.select(selection),
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::Seek { seconds } => self.seek(seconds),
            Command::PollTick => self.poll_tick(),
            Command::ProbeDuration { generation } => self.probe_duration(generation),
            Command::BeginDrag(handle) => self.begin_drag(handle),
            Command::DragMoved { x, track_width } => self.drag_moved(x, track_width),
            Command::EndDrag => self.end_drag(),
            Command::Teardown => self.teardown(),
        }
    }

    /// Current immutable view for the UI.
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            phase: self.phase,
            video_id: self.selected.as_ref().map(|s| s.id.clone()),
            title: self.selected.as_ref().map(|s| s.title.clone()),
            trim: self.trim,
            duration_seconds: self.duration_seconds,
            current_time_seconds: self.current_time_seconds,
            engine_ready: self.adapter.is_ready(),
            video_loading: self.phase == Phase::Loading,
            is_playing: self.phase == Phase::ReadyPlaying,
            drag_active: self.drag.active(),
        }
    }

    fn select(&mut self, selection: VideoSelection) -> Vec<Event> {
        if self
            .selected
            .as_ref()
            .is_some_and(|current| current.id == selection.id)
        {
            return Vec::new();
        }

        let mut events = Vec::new();
        self.stop_polling(&mut events);
        let _ = self.drag.release();

        self.load_generation += 1;
        self.trim = self.store.load(&selection.id).unwrap_or_default();
        self.duration_seconds = 0.0;
        self.current_time_seconds = 0.0;

        info!(
            video_id = selection.id,
            trim_start = self.trim.start,
            trim_end = self.trim.end,
            generation = self.load_generation,
            "selection changed"
        );

        self.adapter.cue(&selection.id);
        self.selected = Some(selection);

        if self.adapter.is_ready() {
            events.extend(self.enter_loading());
        } else {
            events.push(self.snapshot_event());
        }
        events
    }

    fn enter_loading(&mut self) -> Vec<Event> {
        self.phase = Phase::Loading;
        self.probe_attempt = 1;
        vec![
            Event::ProbeScheduled {
                generation: self.load_generation,
                attempt: self.probe_attempt,
            },
            self.snapshot_event(),
        ]
    }

    fn probe_duration(&mut self, generation: u64) -> Vec<Event> {
        if generation != self.load_generation {
            debug!(
                generation,
                current = self.load_generation,
                "stale duration probe discarded"
            );
            return Vec::new();
        }
        if self.phase != Phase::Loading {
            return Vec::new();
        }

        let duration = self.adapter.duration();
        if duration > 0.0 {
            self.duration_seconds = duration;
            self.current_time_seconds = self.trim.start_seconds(duration);
            self.phase = Phase::ReadyPaused;
            info!(duration, "duration resolved");
            return vec![self.snapshot_event()];
        }

        if self.probe_attempt >= MAX_DURATION_PROBES {
            warn!(
                attempts = self.probe_attempt,
                "duration never resolved, staying in loading state"
            );
            return Vec::new();
        }

        self.probe_attempt += 1;
        vec![Event::ProbeScheduled {
            generation: self.load_generation,
            attempt: self.probe_attempt,
        }]
    }

    fn play(&mut self) -> Vec<Event> {
        if self.phase != Phase::ReadyPaused {
            return Vec::new();
        }

        let time = self.adapter.current_time();
        if self.trim.contains_seconds(time, self.duration_seconds) {
            self.current_time_seconds = time;
        } else {
            let start = self.trim.start_seconds(self.duration_seconds);
            debug!(time, start, "position outside trim range, seeking to start");
            self.adapter.seek(start);
            self.current_time_seconds = start;
        }

        self.adapter.play();
        self.phase = Phase::ReadyPlaying;

        let mut events = Vec::new();
        self.start_polling(&mut events);
        events.push(self.snapshot_event());
        events
    }

    fn pause(&mut self) -> Vec<Event> {
        if self.phase != Phase::ReadyPlaying {
            return Vec::new();
        }

        self.adapter.pause();
        self.current_time_seconds = self.adapter.current_time();
        self.phase = Phase::ReadyPaused;

        let mut events = Vec::new();
        self.stop_polling(&mut events);
        events.push(self.snapshot_event());
        events
    }

    fn seek(&mut self, seconds: f64) -> Vec<Event> {
        if !matches!(self.phase, Phase::ReadyPaused | Phase::ReadyPlaying) {
            return Vec::new();
        }

        let clamped = seconds.clamp(0.0, self.duration_seconds);
        self.adapter.seek(clamped);
        self.current_time_seconds = clamped;
        vec![self.snapshot_event()]
    }

    fn poll_tick(&mut self) -> Vec<Event> {
        if self.phase != Phase::ReadyPlaying {
            return Vec::new();
        }

        let time = self.adapter.current_time();

        // The user is actively redefining the boundary; enforcement resumes
        // on release.
        if self.drag.active().is_some() {
            self.current_time_seconds = time;
            return vec![self.snapshot_event()];
        }

        let start = self.trim.start_seconds(self.duration_seconds);
        let end = self.trim.end_seconds(self.duration_seconds);
        if time >= end {
            debug!(time, start, "trim end reached, looping to start");
            self.adapter.seek(start);
            self.current_time_seconds = start;
        } else if time < start {
            debug!(time, start, "position before trim start, seeking forward");
            self.adapter.seek(start);
            self.current_time_seconds = start;
        } else {
            self.current_time_seconds = time;
        }

        vec![self.snapshot_event()]
    }

    fn begin_drag(&mut self, handle: crate::drag::Handle) -> Vec<Event> {
        if !matches!(self.phase, Phase::ReadyPaused | Phase::ReadyPlaying) {
            return Vec::new();
        }
        self.drag.begin(handle);
        vec![self.snapshot_event()]
    }

    fn drag_moved(&mut self, x: f32, track_width: f32) -> Vec<Event> {
        if self.drag.move_to(&mut self.trim, x, track_width) {
            vec![self.snapshot_event()]
        } else {
            Vec::new()
        }
    }

    fn end_drag(&mut self) -> Vec<Event> {
        if self.drag.release().is_none() {
            return Vec::new();
        }

        if let Some(selection) = &self.selected {
            if let Err(error) = self.store.save(&selection.id, self.trim) {
                warn!(video_id = selection.id, %error, "trim range not persisted");
            }
        }

        if self.phase == Phase::ReadyPlaying {
            let time = self.adapter.current_time();
            if !self.trim.contains_seconds(time, self.duration_seconds) {
                let start = self.trim.start_seconds(self.duration_seconds);
                self.adapter.seek(start);
                self.current_time_seconds = start;
            }
        }

        vec![self.snapshot_event()]
    }

    fn teardown(&mut self) -> Vec<Event> {
        if self.phase == Phase::Destroyed {
            return Vec::new();
        }

        let mut events = Vec::new();
        self.stop_polling(&mut events);
        self.adapter.teardown();
        self.phase = Phase::Destroyed;
        info!("synchronizer destroyed");
        events.push(self.snapshot_event());
        events
    }

    fn start_polling(&mut self, events: &mut Vec<Event>) {
        if !self.polling {
            self.polling = true;
            events.push(Event::PollStarted);
        }
    }

    fn stop_polling(&mut self, events: &mut Vec<Event>) {
        if self.polling {
            self.polling = false;
            events.push(Event::PollStopped);
        }
    }

    fn snapshot_event(&self) -> Event {
        Event::SnapshotChanged(self.snapshot())
    }
}
