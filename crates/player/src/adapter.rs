use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

/// Playback states reported by the external engine, with its numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl EngineState {
    /// Maps the engine's numeric state code; unknown codes map to `Unstarted`.
    ///
    /// # Example
    /// ```
    /// use player::EngineState;
    ///
    /// assert_eq!(EngineState::from_code(1), EngineState::Playing);
    /// assert_eq!(EngineState::from_code(42), EngineState::Unstarted);
    /// ```
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Ended,
            1 => Self::Playing,
            2 => Self::Paused,
            3 => Self::Buffering,
            5 => Self::Cued,
            _ => Self::Unstarted,
        }
    }
}

/// Capability surface of one externally-hosted playback engine instance.
///
/// The real engine is callback-driven and asynchronously bootstrapped; the
/// readiness and state-change notifications arrive out of band and are fed to
/// [`EngineAdapter::mark_ready`] and the synchronizer by the host.
pub trait PlaybackEngine {
    /// Replaces the loaded media without starting playback.
    fn cue_video(&mut self, video_id: &str);

    fn play(&mut self);

    fn pause(&mut self);

    fn seek_to(&mut self, seconds: f64);

    /// Total duration in seconds; `0.0` while the media is still resolving.
    fn duration(&self) -> f64;

    fn current_time(&self) -> f64;

    fn state(&self) -> EngineState;

    /// Releases the underlying instance.
    fn destroy(&mut self);
}

static BOOTSTRAP_STARTED: AtomicBool = AtomicBool::new(false);

/// Process-wide bootstrap guard modeling single injection of the engine's
/// loader script. Returns `true` exactly once per process; resets only on
/// process restart.
pub fn request_bootstrap() -> bool {
    !BOOTSTRAP_STARTED.swap(true, Ordering::SeqCst)
}

/// Owns the lifecycle of at most one engine instance and absorbs the
/// mismatch between the engine's callback-driven API and the synchronizer's
/// synchronous query contract.
///
/// Every command is a defensive no-op until an instance is attached and has
/// reported readiness; queries return zero/unknown in that window.
#[derive(Debug)]
pub struct EngineAdapter<E> {
    instance: Option<E>,
    ready: bool,
    pending_cue: Option<String>,
}

impl<E> Default for EngineAdapter<E>
where
    E: PlaybackEngine,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EngineAdapter<E>
where
    E: PlaybackEngine,
{
    pub fn new() -> Self {
        Self {
            instance: None,
            ready: false,
            pending_cue: None,
        }
    }

    /// Installs a freshly constructed instance. A previously attached
    /// instance is destroyed first; the new one is not usable until its own
    /// ready notification arrives.
    pub fn attach(&mut self, instance: E) {
        if let Some(mut old) = self.instance.replace(instance) {
            debug!("replacing live engine instance");
            old.destroy();
        }
        self.ready = false;
    }

    /// Handles the engine's ready notification and flushes the latest
    /// deferred cue, if any. A late notification arriving after teardown is
    /// ignored because no instance remains attached.
    pub fn mark_ready(&mut self) {
        let Some(instance) = self.instance.as_mut() else {
            debug!("ready notification ignored: no instance");
            return;
        };
        self.ready = true;
        if let Some(video_id) = self.pending_cue.take() {
            debug!(video_id, "flushing deferred cue");
            instance.cue_video(&video_id);
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Cues `video_id` now, or defers it until readiness. Only the latest
    /// requested id is honored; earlier deferred requests are overwritten.
    pub fn cue(&mut self, video_id: &str) {
        match self.instance.as_mut() {
            Some(instance) if self.ready => instance.cue_video(video_id),
            _ => {
                debug!(video_id, "cue deferred until engine is ready");
                self.pending_cue = Some(video_id.to_owned());
            }
        }
    }

    pub fn play(&mut self) {
        if let Some(instance) = self.ready_instance() {
            instance.play();
        }
    }

    pub fn pause(&mut self) {
        if let Some(instance) = self.ready_instance() {
            instance.pause();
        }
    }

    pub fn seek(&mut self, seconds: f64) {
        if let Some(instance) = self.ready_instance() {
            instance.seek_to(seconds);
        }
    }

    pub fn duration(&self) -> f64 {
        match &self.instance {
            Some(instance) if self.ready => instance.duration(),
            _ => 0.0,
        }
    }

    pub fn current_time(&self) -> f64 {
        match &self.instance {
            Some(instance) if self.ready => instance.current_time(),
            _ => 0.0,
        }
    }

    pub fn state(&self) -> EngineState {
        match &self.instance {
            Some(instance) if self.ready => instance.state(),
            _ => EngineState::Unstarted,
        }
    }

    /// Destroys the attached instance. Safe to call repeatedly or before any
    /// instance exists.
    pub fn teardown(&mut self) {
        if let Some(mut instance) = self.instance.take() {
            instance.destroy();
        }
        self.ready = false;
        self.pending_cue = None;
    }

    fn ready_instance(&mut self) -> Option<&mut E> {
        if self.ready { self.instance.as_mut() } else { None }
    }
}
