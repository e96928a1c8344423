use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::detection::NutClass;
use crate::tracker::FrameUpdate;

/// Class-keyed tally with named fields per thread size. The all-classes
/// aggregate is derived, never stored, so it cannot drift out of sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassCounts {
    pub m6: u32,
    pub m8: u32,
    pub m10: u32,
    pub m12: u32,
}

impl ClassCounts {
    pub fn get(&self, class: NutClass) -> u32 {
        match class {
            NutClass::M6 => self.m6,
            NutClass::M8 => self.m8,
            NutClass::M10 => self.m10,
            NutClass::M12 => self.m12,
        }
    }

    pub fn bump(&mut self, class: NutClass) {
        let slot = match class {
            NutClass::M6 => &mut self.m6,
            NutClass::M8 => &mut self.m8,
            NutClass::M10 => &mut self.m10,
            NutClass::M12 => &mut self.m12,
        };
        *slot += 1;
    }

    /// Sum over all classes ("all sizes" row).
    pub fn total(&self) -> u32 {
        self.m6 + self.m8 + self.m10 + self.m12
    }

    pub fn clear(&mut self) {
        *self = ClassCounts::default();
    }
}

/// Consistent read of both tallies at one instant.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TallySnapshot {
    /// Presence tally for the most recent frame, fully recomputed per frame.
    pub current: ClassCounts,
    /// Cumulative crossings since the last reset. Non-decreasing between
    /// resets.
    pub total: ClassCounts,
}

/// Running totals fed by tracker output. `current` mirrors the last frame's
/// visible tally; `total` accumulates crossing events.
#[derive(Debug, Default)]
pub struct Counter {
    current: ClassCounts,
    total: ClassCounts,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one frame's tracker output in: replace the visible tally, add
    /// one per crossing event. A frame may carry zero, one, or several
    /// crossings (at most one per distinct track).
    pub fn apply(&mut self, update: &FrameUpdate) {
        self.current = update.visible;
        for event in &update.crossings {
            self.total.bump(event.class);
        }
    }

    pub fn snapshot(&self) -> TallySnapshot {
        TallySnapshot {
            current: self.current,
            total: self.total,
        }
    }

    /// Zero both tallies. Live tracks' `counted` flags are not touched, so a
    /// nut already counted does not count again after a reset.
    pub fn reset(&mut self) {
        self.current.clear();
        self.total.clear();
    }
}

/// Shared handle for the pipeline-thread writer and snapshot readers on
/// other threads. The mutex makes `apply`, `reset`, and `snapshot` atomic
/// relative to each other: no crossing event is lost or double-applied
/// across a reset boundary, and readers never see a half-applied frame.
#[derive(Clone, Default)]
pub struct SharedCounter {
    inner: Arc<Mutex<Counter>>,
}

impl SharedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&self, update: &FrameUpdate) {
        self.inner.lock().expect("counter lock poisoned").apply(update);
    }

    pub fn snapshot(&self) -> TallySnapshot {
        self.inner.lock().expect("counter lock poisoned").snapshot()
    }

    pub fn reset(&self) {
        self.inner.lock().expect("counter lock poisoned").reset();
    }
}
