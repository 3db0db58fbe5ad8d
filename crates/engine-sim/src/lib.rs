//! Deterministic stand-in for the externally-hosted playback engine.
//!
//! The real engine lives behind an asynchronously injected loader script and
//! is reachable only through its callback API. This crate reproduces that
//! contract for production wiring and integration tests: an instance arrives
//! some time after bootstrap is requested, cued media takes a moment before
//! its duration resolves, and playback time advances against the wall clock.

use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use player::{EngineState, PlaybackEngine};
use tracing::{debug, info};

/// Delay between bootstrap request and instance delivery.
pub const BOOT_DELAY: Duration = Duration::from_millis(250);
/// Delay between cueing a video and its duration becoming readable.
pub const CUE_LATENCY: Duration = Duration::from_millis(300);

/// Simulated engine instance with a fixed id-to-duration catalog.
///
/// Cueing an id absent from the catalog leaves the duration at zero forever,
/// which exercises the synchronizer's bounded-probe degradation path.
#[derive(Debug)]
pub struct SimEngine {
    catalog: HashMap<String, f64>,
    cue_latency: Duration,
    cued: Option<CuedMedia>,
    destroyed: bool,
}

#[derive(Debug)]
struct CuedMedia {
    video_id: String,
    cued_at: Instant,
    base_seconds: f64,
    playing_since: Option<Instant>,
}

impl SimEngine {
    pub fn new(catalog: HashMap<String, f64>) -> Self {
        Self {
            catalog,
            cue_latency: CUE_LATENCY,
            cued: None,
            destroyed: false,
        }
    }

    /// Engine preloaded with the demo catalog used by the dashboard.
    pub fn with_demo_catalog() -> Self {
        Self::new(demo_catalog())
    }

    /// Overrides the cue latency; tests use zero to probe synchronously.
    pub fn with_cue_latency(mut self, latency: Duration) -> Self {
        self.cue_latency = latency;
        self
    }

    fn media_resolved(&self, media: &CuedMedia) -> bool {
        media.cued_at.elapsed() >= self.cue_latency && self.catalog.contains_key(&media.video_id)
    }
}

impl PlaybackEngine for SimEngine {
    fn cue_video(&mut self, video_id: &str) {
        if self.destroyed {
            return;
        }
        debug!(video_id, "sim engine cued");
        self.cued = Some(CuedMedia {
            video_id: video_id.to_owned(),
            cued_at: Instant::now(),
            base_seconds: 0.0,
            playing_since: None,
        });
    }

    fn play(&mut self) {
        if self.destroyed {
            return;
        }
        if let Some(media) = self.cued.as_mut() {
            if media.playing_since.is_none() {
                media.playing_since = Some(Instant::now());
            }
        }
    }

    fn pause(&mut self) {
        if self.destroyed {
            return;
        }
        if let Some(media) = self.cued.as_mut() {
            if let Some(since) = media.playing_since.take() {
                media.base_seconds += since.elapsed().as_secs_f64();
            }
        }
    }

    fn seek_to(&mut self, seconds: f64) {
        if self.destroyed {
            return;
        }
        if let Some(media) = self.cued.as_mut() {
            media.base_seconds = seconds.max(0.0);
            if media.playing_since.is_some() {
                media.playing_since = Some(Instant::now());
            }
        }
    }

    fn duration(&self) -> f64 {
        if self.destroyed {
            return 0.0;
        }
        match &self.cued {
            Some(media) if self.media_resolved(media) => {
                self.catalog.get(&media.video_id).copied().unwrap_or(0.0)
            }
            _ => 0.0,
        }
    }

    fn current_time(&self) -> f64 {
        if self.destroyed {
            return 0.0;
        }
        match &self.cued {
            Some(media) => {
                let elapsed = media
                    .playing_since
                    .map(|since| since.elapsed().as_secs_f64())
                    .unwrap_or(0.0);
                media.base_seconds + elapsed
            }
            None => 0.0,
        }
    }

    fn state(&self) -> EngineState {
        if self.destroyed {
            return EngineState::Unstarted;
        }
        match &self.cued {
            Some(media) if media.playing_since.is_some() => EngineState::Playing,
            Some(media) if self.media_resolved(media) => EngineState::Paused,
            Some(_) => EngineState::Buffering,
            None => EngineState::Unstarted,
        }
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        debug!("sim engine destroyed");
        self.cued = None;
        self.destroyed = true;
    }
}

/// Models the asynchronous loader script: delivers one instance after
/// [`BOOT_DELAY`]. Delivery on the channel is the ready callback.
pub fn spawn_bootstrap() -> mpsc::Receiver<SimEngine> {
    let (tx, rx) = mpsc::sync_channel(1);
    thread::spawn(move || {
        thread::sleep(BOOT_DELAY);
        info!("sim engine bootstrap finished");
        let _ = tx.send(SimEngine::with_demo_catalog());
    });
    rx
}

/// Catalog backing the demo dashboard; ids match the bundled listing data.
pub fn demo_catalog() -> HashMap<String, f64> {
    [
        ("dQw4w9WgXcQ", 212.0),
        ("9bZkp7q19f0", 252.0),
        ("kJQP7kiw5Fk", 281.0),
        ("JGwWNGJdvx8", 263.0),
        ("RgKAFK5djSk", 229.0),
        ("OPf0YbXqDm0", 270.0),
        ("CevxZvSJLk8", 242.0),
        ("hT_nvWreIhg", 257.0),
    ]
    .into_iter()
    .map(|(id, duration)| (id.to_owned(), duration))
    .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use player::{EngineState, PlaybackEngine};

    use super::SimEngine;

    fn catalog() -> HashMap<String, f64> {
        HashMap::from([(String::from("known"), 120.0)])
    }

    fn instant_engine() -> SimEngine {
        SimEngine::new(catalog()).with_cue_latency(Duration::ZERO)
    }

    #[test]
    fn duration_is_zero_before_any_cue() {
        let engine = instant_engine();
        assert_eq!(engine.duration(), 0.0);
        assert_eq!(engine.state(), EngineState::Unstarted);
    }

    #[test]
    fn cued_known_video_resolves_catalog_duration() {
        let mut engine = instant_engine();
        engine.cue_video("known");

        assert_eq!(engine.duration(), 120.0);
        assert_eq!(engine.state(), EngineState::Paused);
    }

    #[test]
    fn unknown_video_never_resolves_duration() {
        let mut engine = instant_engine();
        engine.cue_video("missing");

        assert_eq!(engine.duration(), 0.0);
        assert_eq!(engine.state(), EngineState::Buffering);
    }

    #[test]
    fn cue_latency_hides_duration_until_elapsed() {
        let mut engine = SimEngine::new(catalog()).with_cue_latency(Duration::from_secs(3600));
        engine.cue_video("known");

        assert_eq!(engine.duration(), 0.0);
        assert_eq!(engine.state(), EngineState::Buffering);
    }

    #[test]
    fn seek_repositions_current_time() {
        let mut engine = instant_engine();
        engine.cue_video("known");
        engine.seek_to(42.5);

        assert_eq!(engine.current_time(), 42.5);
    }

    #[test]
    fn pause_freezes_current_time() {
        let mut engine = instant_engine();
        engine.cue_video("known");
        engine.seek_to(10.0);
        engine.play();
        engine.pause();

        let frozen = engine.current_time();
        assert!(frozen >= 10.0);
        assert_eq!(engine.current_time(), frozen);
        assert_eq!(engine.state(), EngineState::Paused);
    }

    #[test]
    fn destroy_silences_all_queries_and_commands() {
        let mut engine = instant_engine();
        engine.cue_video("known");
        engine.destroy();

        engine.play();
        engine.cue_video("known");
        assert_eq!(engine.duration(), 0.0);
        assert_eq!(engine.current_time(), 0.0);
        assert_eq!(engine.state(), EngineState::Unstarted);
    }
}
