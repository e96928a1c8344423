use std::collections::HashSet;
use std::time::{Duration, Instant};

use nalgebra::Point2;
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::counter::ClassCounts;
use crate::detection::{NutClass, Observation};
use crate::track::Track;

/// A confirmed counting event: one track moved from above the counting line
/// to at-or-below it for the first time in its life.
#[derive(Debug, Clone)]
pub struct CrossingEvent {
    pub track_id: Uuid,
    pub class: NutClass,
    /// Camera-space position at the moment the crossing was confirmed.
    pub position: Point2<f32>,
}

/// Result of one `update` call: the newly confirmed crossings plus the
/// per-class presence tally for this frame (observations matched or created,
/// independent of crossing state).
#[derive(Debug, Clone, Default)]
pub struct FrameUpdate {
    pub crossings: Vec<CrossingEvent>,
    pub visible: ClassCounts,
}

/// Associates per-frame observations with persistent tracks and detects
/// line crossings.
///
/// Matching is first-fit: each observation takes the first live track in
/// insertion order with the same class within `max_tracking_distance`, not
/// the nearest one. Ambiguity resolves by traversal order. Changing this to
/// best-fit would change counting behavior under ambiguity, so it stays as
/// the original conveyor tuning had it.
pub struct Tracker {
    tracks: Vec<Track>,
    max_tracking_distance: f32,
    disappear_budget: Duration,
    line_y: f32,
    capacity: usize,
}

impl Tracker {
    pub fn new(config: &Config) -> Self {
        Self {
            tracks: Vec::new(),
            max_tracking_distance: config.max_tracking_distance,
            disappear_budget: config.disappear_budget(),
            line_y: config.line_y,
            capacity: config.max_tracked,
        }
    }

    /// Live tracks in insertion order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn line_y(&self) -> f32 {
        self.line_y
    }

    /// Process one frame's full detection list. Order within the list is
    /// insignificant to the caller; ties inside are resolved by traversal
    /// order. An empty list is a normal frame: tracks age, nothing fires.
    pub fn update(&mut self, observations: &[Observation]) -> FrameUpdate {
        self.update_at(observations, Instant::now())
    }

    /// `update` with an injected clock, for the aging and eviction paths.
    pub fn update_at(&mut self, observations: &[Observation], now: Instant) -> FrameUpdate {
        let mut update = FrameUpdate::default();
        // Tracks matched or created this call: never re-matched by a second
        // observation, never evicted to make room.
        let mut fresh: HashSet<Uuid> = HashSet::with_capacity(observations.len());

        for obs in observations {
            let idx = match self.find_match(obs, &fresh) {
                Some(idx) => {
                    self.tracks[idx].advance(obs.position, now);
                    idx
                }
                None => self.create_track(obs, now, &fresh),
            };
            let track = &mut self.tracks[idx];
            fresh.insert(track.id);
            update.visible.bump(obs.class);

            if track.check_crossing(self.line_y) {
                debug!(id = %track.id, class = %track.class, y = track.position.y, "crossing counted");
                update.crossings.push(CrossingEvent {
                    track_id: track.id,
                    class: track.class,
                    position: track.position,
                });
            }
        }

        self.age_out(now);
        update
    }

    /// First live track of the same class within the distance gate, skipping
    /// tracks already matched this call.
    fn find_match(&self, obs: &Observation, fresh: &HashSet<Uuid>) -> Option<usize> {
        self.tracks.iter().position(|track| {
            track.class == obs.class
                && !fresh.contains(&track.id)
                && track.distance_to(&obs.position) < self.max_tracking_distance
        })
    }

    fn create_track(&mut self, obs: &Observation, now: Instant, fresh: &HashSet<Uuid>) -> usize {
        if self.tracks.len() >= self.capacity {
            self.evict_least_recent(fresh);
        }
        let track = Track::new(obs.class, obs.position, now);
        debug!(id = %track.id, class = %track.class, "new track");
        self.tracks.push(track);
        self.tracks.len() - 1
    }

    /// Least-recently-seen eviction across all classes. A frame where every
    /// live track is fresh has no victim; the bound is exceeded until aging
    /// reclaims a track.
    fn evict_least_recent(&mut self, fresh: &HashSet<Uuid>) {
        let victim = self
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, track)| !fresh.contains(&track.id))
            .min_by_key(|(_, track)| track.last_seen)
            .map(|(idx, _)| idx);
        match victim {
            Some(idx) => {
                let track = self.tracks.remove(idx);
                debug!(id = %track.id, class = %track.class, "capacity eviction");
            }
            None => debug!("all live tracks fresh, capacity exceeded this frame"),
        }
    }

    fn age_out(&mut self, now: Instant) {
        let budget = self.disappear_budget;
        let before = self.tracks.len();
        self.tracks
            .retain(|track| now.duration_since(track.last_seen) <= budget);
        let dropped = before - self.tracks.len();
        if dropped > 0 {
            debug!(dropped, "aged out disappeared tracks");
        }
    }
}
