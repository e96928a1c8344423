pub mod config;
pub mod counter;
pub mod detection;
pub mod error;
pub mod event_log;
pub mod pipeline;
pub mod track;
pub mod tracker;

// Re-export main types
pub use crate::config::Config;
pub use crate::counter::{ClassCounts, Counter, SharedCounter, TallySnapshot};
pub use crate::detection::{NutClass, Observation, ScriptedDetector};
pub use crate::error::Error;
pub use crate::pipeline::CountingPipeline;
pub use crate::track::Track;
pub use crate::tracker::{CrossingEvent, FrameUpdate, Tracker};
