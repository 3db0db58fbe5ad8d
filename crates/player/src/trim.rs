use serde::{Deserialize, Serialize};

/// Minimum distance between the two trim handles, in percentage points.
pub const MIN_GAP_PCT: f64 = 5.0;

/// Playable sub-interval of a video, expressed as percentages of the total
/// duration so the same range stays valid across videos of different lengths.
///
/// Invariant: `end >= start + MIN_GAP_PCT`, with `start` in `[0, 100)` and
/// `end` in `(0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    /// Untrimmed range covering the whole video.
    pub const FULL: Self = Self {
        start: 0.0,
        end: 100.0,
    };

    /// Converts the start percentage into seconds against a live duration.
    ///
    /// # Example
    /// ```
    /// use player::TrimRange;
    ///
    /// let range = TrimRange { start: 20.0, end: 80.0 };
    /// assert_eq!(range.start_seconds(100.0), 20.0);
    /// ```
    pub fn start_seconds(&self, duration_seconds: f64) -> f64 {
        self.start / 100.0 * duration_seconds
    }

    /// Converts the end percentage into seconds against a live duration.
    pub fn end_seconds(&self, duration_seconds: f64) -> f64 {
        self.end / 100.0 * duration_seconds
    }

    /// Returns whether `t` falls inside the half-open playable window.
    pub fn contains_seconds(&self, t: f64, duration_seconds: f64) -> bool {
        t >= self.start_seconds(duration_seconds) && t < self.end_seconds(duration_seconds)
    }

    /// Validates the handle-gap invariant and percentage bounds.
    pub fn is_valid(&self) -> bool {
        self.start.is_finite()
            && self.end.is_finite()
            && self.start >= 0.0
            && self.end <= 100.0
            && self.end >= self.start + MIN_GAP_PCT
    }
}

impl Default for TrimRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// Converts an absolute time back into a percentage of the duration.
pub fn pct_from_seconds(seconds: f64, duration_seconds: f64) -> f64 {
    if duration_seconds <= 0.0 {
        return 0.0;
    }
    (seconds / duration_seconds * 100.0).clamp(0.0, 100.0)
}

/// Formats a time readout as `m:ss`, truncating to whole seconds.
///
/// # Example
/// ```
/// use player::format_time;
///
/// assert_eq!(format_time(80.0), "1:20");
/// assert_eq!(format_time(20.9), "0:20");
/// ```
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::{MIN_GAP_PCT, TrimRange, format_time, pct_from_seconds};

    #[test]
    fn default_range_covers_whole_video() {
        assert_eq!(TrimRange::default(), TrimRange::FULL);
    }

    #[test]
    fn saved_range_maps_to_expected_display_times() {
        let range = TrimRange {
            start: 20.0,
            end: 80.0,
        };

        assert_eq!(format_time(range.start_seconds(100.0)), "0:20");
        assert_eq!(format_time(range.end_seconds(100.0)), "1:20");
    }

    #[test]
    fn percent_to_seconds_round_trip_recovers_percent() {
        for duration in [1.0, 37.5, 100.0, 7_200.0] {
            for pct in [0.0f64, 5.0, 33.3, 99.9, 100.0] {
                let range = TrimRange {
                    start: pct.min(95.0),
                    end: 100.0,
                };
                let recovered = pct_from_seconds(range.start_seconds(duration), duration);
                assert!((recovered - range.start).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn contains_treats_end_boundary_as_exclusive() {
        let range = TrimRange {
            start: 20.0,
            end: 80.0,
        };

        assert!(range.contains_seconds(20.0, 100.0));
        assert!(range.contains_seconds(79.9, 100.0));
        assert!(!range.contains_seconds(80.0, 100.0));
        assert!(!range.contains_seconds(19.9, 100.0));
    }

    #[test]
    fn ranges_violating_minimum_gap_are_invalid() {
        let too_narrow = TrimRange {
            start: 50.0,
            end: 50.0 + MIN_GAP_PCT - 0.1,
        };
        assert!(!too_narrow.is_valid());

        let exact_gap = TrimRange {
            start: 50.0,
            end: 50.0 + MIN_GAP_PCT,
        };
        assert!(exact_gap.is_valid());
    }

    #[test]
    fn out_of_bounds_percentages_are_invalid() {
        assert!(
            !TrimRange {
                start: -1.0,
                end: 50.0
            }
            .is_valid()
        );
        assert!(
            !TrimRange {
                start: 0.0,
                end: 100.1
            }
            .is_valid()
        );
        assert!(
            !TrimRange {
                start: f64::NAN,
                end: 100.0
            }
            .is_valid()
        );
    }

    #[test]
    fn format_time_truncates_and_zero_pads_seconds() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(5.999), "0:05");
        assert_eq!(format_time(61.0), "1:01");
        assert_eq!(format_time(-3.0), "0:00");
    }
}
