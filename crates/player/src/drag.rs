use crate::trim::{MIN_GAP_PCT, TrimRange};

/// One of the two draggable trim boundary markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Left,
    Right,
}

/// Tracks which handle a pointer gesture has captured.
///
/// The controller owns no trim data of its own; it mutates the shared
/// [`TrimRange`] only between `begin` and `release`, which is the only window
/// in which the synchronizer suspends boundary enforcement.
#[derive(Debug, Default)]
pub struct DragController {
    active: Option<Handle>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures `handle` for the gesture. A second press while a gesture is
    /// live re-captures, matching pointer-capture semantics.
    pub fn begin(&mut self, handle: Handle) {
        self.active = Some(handle);
    }

    pub fn active(&self) -> Option<Handle> {
        self.active
    }

    /// Applies one pointer move at horizontal position `x` over a track of
    /// `track_width` pixels. Returns whether the range changed. The gap
    /// invariant holds after every intermediate move, not only at release.
    pub fn move_to(&self, trim: &mut TrimRange, x: f32, track_width: f32) -> bool {
        let Some(handle) = self.active else {
            return false;
        };

        let pct = position_pct(x, track_width);
        let clamped = clamp_to_gap(trim, handle, pct);
        match handle {
            Handle::Left if trim.start != clamped => {
                trim.start = clamped;
                true
            }
            Handle::Right if trim.end != clamped => {
                trim.end = clamped;
                true
            }
            _ => false,
        }
    }

    /// Ends the gesture, returning the handle that was captured so the caller
    /// can commit the resulting range.
    pub fn release(&mut self) -> Option<Handle> {
        self.active.take()
    }
}

/// Maps a horizontal pixel position to a percentage of the track, clamped to
/// `[0, 100]`.
///
/// # Example
/// ```
/// use player::drag::position_pct;
///
/// assert_eq!(position_pct(100.0, 200.0), 50.0);
/// assert_eq!(position_pct(-10.0, 200.0), 0.0);
/// assert_eq!(position_pct(250.0, 200.0), 100.0);
/// ```
pub fn position_pct(x: f32, track_width: f32) -> f64 {
    if track_width <= 0.0 {
        return 0.0;
    }
    ((x / track_width) as f64 * 100.0).clamp(0.0, 100.0)
}

/// Clamps a requested handle position so the dragged handle cannot cross the
/// opposite handle minus/plus the minimum gap.
pub fn clamp_to_gap(trim: &TrimRange, handle: Handle, pct: f64) -> f64 {
    match handle {
        Handle::Left => pct.min(trim.end - MIN_GAP_PCT),
        Handle::Right => pct.max(trim.start + MIN_GAP_PCT),
    }
}

#[cfg(test)]
mod tests {
    use super::{DragController, Handle, clamp_to_gap, position_pct};
    use crate::trim::{MIN_GAP_PCT, TrimRange};

    #[test]
    fn position_maps_track_edges_to_percent_bounds() {
        assert_eq!(position_pct(0.0, 320.0), 0.0);
        assert_eq!(position_pct(320.0, 320.0), 100.0);
        assert_eq!(position_pct(80.0, 320.0), 25.0);
    }

    #[test]
    fn degenerate_track_width_maps_to_zero() {
        assert_eq!(position_pct(50.0, 0.0), 0.0);
        assert_eq!(position_pct(50.0, -1.0), 0.0);
    }

    #[test]
    fn left_handle_is_clamped_below_right_minus_gap() {
        let trim = TrimRange {
            start: 10.0,
            end: 80.0,
        };

        // Raw position 85 while end is 80 clamps to 75.
        assert_eq!(clamp_to_gap(&trim, Handle::Left, 85.0), 75.0);
        assert_eq!(clamp_to_gap(&trim, Handle::Left, 30.0), 30.0);
    }

    #[test]
    fn right_handle_is_clamped_above_left_plus_gap() {
        let trim = TrimRange {
            start: 40.0,
            end: 90.0,
        };

        assert_eq!(clamp_to_gap(&trim, Handle::Right, 10.0), 45.0);
        assert_eq!(clamp_to_gap(&trim, Handle::Right, 70.0), 70.0);
    }

    #[test]
    fn gap_invariant_holds_after_every_intermediate_move() {
        let mut trim = TrimRange::FULL;
        let mut drag = DragController::new();
        drag.begin(Handle::Left);

        for x in [0.0_f32, 40.0, 95.0, 99.0, 100.0, 70.0] {
            drag.move_to(&mut trim, x, 100.0);
            assert!(trim.end - trim.start >= MIN_GAP_PCT, "violated at x={x}");
        }

        drag.release();
        drag.begin(Handle::Right);
        for x in [100.0_f32, 50.0, 1.0, 0.0, 80.0] {
            drag.move_to(&mut trim, x, 100.0);
            assert!(trim.end - trim.start >= MIN_GAP_PCT, "violated at x={x}");
        }
    }

    #[test]
    fn moves_without_an_active_gesture_are_ignored() {
        let mut trim = TrimRange::FULL;
        let drag = DragController::new();

        assert!(!drag.move_to(&mut trim, 50.0, 100.0));
        assert_eq!(trim, TrimRange::FULL);
    }

    #[test]
    fn release_reports_captured_handle_exactly_once() {
        let mut drag = DragController::new();
        drag.begin(Handle::Right);

        assert_eq!(drag.release(), Some(Handle::Right));
        assert_eq!(drag.release(), None);
    }

    #[test]
    fn repeated_gestures_track_capture_state_cleanly() {
        let mut trim = TrimRange::FULL;
        let mut drag = DragController::new();

        for _ in 0..3 {
            drag.begin(Handle::Left);
            drag.move_to(&mut trim, 20.0, 100.0);
            assert!(drag.release().is_some());
            assert!(drag.active().is_none());
        }
        assert_eq!(trim.start, 20.0);
    }
}
