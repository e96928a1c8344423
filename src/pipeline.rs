use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::Config;
use crate::counter::{SharedCounter, TallySnapshot};
use crate::detection::Observation;
use crate::tracker::{FrameUpdate, Tracker};

/// Single-writer latest-value slot for handing frames from a capture thread
/// to the pipeline thread. A put replaces whatever is pending: at most one
/// frame is ever in flight, and a stale frame is dropped rather than queued.
#[derive(Debug, Default)]
pub struct LatestSlot<T> {
    slot: Mutex<Option<T>>,
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Store a value, returning the stale one it displaced, if any.
    pub fn put(&self, value: T) -> Option<T> {
        self.slot.lock().expect("slot lock poisoned").replace(value)
    }

    /// Take the pending value, leaving the slot empty.
    pub fn take(&self) -> Option<T> {
        self.slot.lock().expect("slot lock poisoned").take()
    }
}

/// The per-frame pipeline: observations in, tally out. Owns the tracker
/// (single mutating thread); the counter is shared so presentation layers
/// can read consistent snapshots and trigger resets from elsewhere.
pub struct CountingPipeline {
    tracker: Tracker,
    counter: SharedCounter,
}

impl CountingPipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            tracker: Tracker::new(config),
            counter: SharedCounter::new(),
        }
    }

    /// Run one frame through track-update and counting. Returns the frame's
    /// update so observers (event logs, overlays) can subscribe to crossings.
    pub fn process_frame(&mut self, observations: &[Observation]) -> FrameUpdate {
        self.process_frame_at(observations, Instant::now())
    }

    pub fn process_frame_at(&mut self, observations: &[Observation], now: Instant) -> FrameUpdate {
        let update = self.tracker.update_at(observations, now);
        self.counter.apply(&update);
        update
    }

    pub fn snapshot(&self) -> TallySnapshot {
        self.counter.snapshot()
    }

    /// Operator reset: zero both tallies. Live tracks keep their `counted`
    /// flags, so nothing in view is counted a second time.
    pub fn reset(&self) {
        self.counter.reset();
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Clone of the shared counter handle, for a presentation thread.
    pub fn counter(&self) -> SharedCounter {
        self.counter.clone()
    }
}

/// Convenience for spawning readers: the slot behind an `Arc`.
pub type SharedSlot<T> = Arc<LatestSlot<T>>;
