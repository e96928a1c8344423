use std::time::Instant;

use nalgebra::Point2;
use uuid::Uuid;

use crate::detection::NutClass;

/// One hypothesized persistent identity, carried across frames. The class is
/// fixed at creation; re-matching requires class equality, so a track never
/// changes type mid-life.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: Uuid,
    pub class: NutClass,
    pub position: Point2<f32>,
    /// Position at the prior successful match. Only read by the
    /// crossing-direction check.
    pub previous_position: Point2<f32>,
    pub last_seen: Instant,
    /// Flips false -> true at most once, on the counting event. Never
    /// cleared for the remainder of the track's life.
    pub counted: bool,
}

impl Track {
    pub fn new(class: NutClass, position: Point2<f32>, now: Instant) -> Self {
        Self {
            id: Uuid::new_v4(),
            class,
            position,
            previous_position: position,
            last_seen: now,
            counted: false,
        }
    }

    /// Apply a successful match: shift the position pair and refresh
    /// `last_seen`. The `counted` flag is untouched.
    pub fn advance(&mut self, position: Point2<f32>, now: Instant) {
        self.previous_position = self.position;
        self.position = position;
        self.last_seen = now;
    }

    pub fn distance_to(&self, position: &Point2<f32>) -> f32 {
        nalgebra::distance(&self.position, position)
    }

    /// One-directional crossing check, run after a position update. Fires
    /// iff the track moved from above the line to at-or-below it and has not
    /// fired before; sets `counted` on firing. Upward motion and later
    /// oscillation around the line neither fire nor un-fire.
    pub fn check_crossing(&mut self, line_y: f32) -> bool {
        if !self.counted && self.previous_position.y < line_y && self.position.y >= line_y {
            self.counted = true;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn track_at(y: f32) -> Track {
        Track::new(NutClass::M6, Point2::new(100.0, y), Instant::now())
    }

    #[test]
    fn new_track_starts_uncounted_with_equal_positions() {
        let track = track_at(50.0);
        assert_eq!(track.position, track.previous_position);
        assert!(!track.counted);
    }

    #[test]
    fn advance_shifts_position_pair() {
        let mut track = track_at(50.0);
        let later = track.last_seen + std::time::Duration::from_millis(33);
        track.advance(Point2::new(105.0, 60.0), later);
        assert_relative_eq!(track.previous_position.y, 50.0);
        assert_relative_eq!(track.position.y, 60.0);
        assert_eq!(track.last_seen, later);
    }

    #[test]
    fn distance_is_euclidean() {
        let track = track_at(100.0);
        assert_relative_eq!(track.distance_to(&Point2::new(103.0, 104.0)), 5.0);
    }

    #[test]
    fn crossing_fires_on_downward_transition_only() {
        let mut track = track_at(590.0);
        let now = track.last_seen;
        track.advance(Point2::new(100.0, 605.0), now);
        assert!(track.check_crossing(600.0));
        assert!(track.counted);
    }

    #[test]
    fn freshly_created_track_on_the_line_does_not_fire() {
        // previous == position at creation, so there is no transition
        let mut track = track_at(605.0);
        assert!(!track.check_crossing(600.0));
        assert!(!track.counted);
    }

    #[test]
    fn upward_crossing_does_not_fire() {
        let mut track = track_at(605.0);
        let now = track.last_seen;
        track.advance(Point2::new(100.0, 590.0), now);
        assert!(!track.check_crossing(600.0));
        assert!(!track.counted);
    }

    #[test]
    fn oscillation_fires_at_most_once() {
        let mut track = track_at(590.0);
        let now = track.last_seen;
        track.advance(Point2::new(100.0, 605.0), now);
        assert!(track.check_crossing(600.0));
        // back above, then below again: counted stays set, no second event
        track.advance(Point2::new(100.0, 595.0), now);
        assert!(!track.check_crossing(600.0));
        track.advance(Point2::new(100.0, 610.0), now);
        assert!(!track.check_crossing(600.0));
        assert!(track.counted);
    }

    #[test]
    fn landing_exactly_on_the_line_counts() {
        let mut track = track_at(599.0);
        let now = track.last_seen;
        track.advance(Point2::new(100.0, 600.0), now);
        assert!(track.check_crossing(600.0));
    }
}
