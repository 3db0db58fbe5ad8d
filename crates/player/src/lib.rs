//! UI-agnostic playback core: engine adapter seam, trim persistence, the
//! playback synchronizer state machine, and the trim-handle drag controller.

pub mod adapter;
pub mod api;
pub mod drag;
pub mod error;
pub mod store;
pub mod sync;
pub mod trim;

pub use adapter::{EngineAdapter, EngineState, PlaybackEngine, request_bootstrap};
pub use api::{Command, Event, Phase, PlayerSnapshot, VideoSelection};
pub use drag::{DragController, Handle};
pub use error::{PlayerError, Result};
pub use store::TrimStore;
pub use sync::{MAX_DURATION_PROBES, POLL_INTERVAL_MS, PROBE_INTERVAL_MS, Synchronizer};
pub use trim::{MIN_GAP_PCT, TrimRange, format_time, pct_from_seconds};
