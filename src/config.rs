use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;

/// Runtime parameters for the detection filter and the tracking/counting
/// core. Loaded from a JSON file; every field has a default matching the
/// conveyor setup this was tuned on (640x480 camera, 30 fps nominal).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Per-channel confidence floor applied by the detector before
    /// observations reach the tracker.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    /// Minimum activated area (model cells) for a detection to count as
    /// visible. Also a detector-side filter.
    #[serde(default = "default_min_visible_area")]
    pub min_visible_area: u32,
    /// Euclidean gate for re-matching an observation to a live track, in
    /// camera pixels.
    #[serde(default = "default_max_tracking_distance")]
    pub max_tracking_distance: f32,
    /// Frames a track may go unmatched before it is aged out. Converted to
    /// a wall-clock budget via `nominal_frame_rate`.
    #[serde(default = "default_max_disappeared_frames")]
    pub max_disappeared_frames: u32,
    /// Frame rate the disappearance budget is expressed against. The driving
    /// loop's actual rate may differ; aging is wall-clock based.
    #[serde(default = "default_nominal_frame_rate")]
    pub nominal_frame_rate: f32,
    /// Y coordinate of the counting line (origin top-left, y grows downward).
    #[serde(default = "default_line_y")]
    pub line_y: f32,
    /// Bound on simultaneously live tracks.
    #[serde(default = "default_max_tracked")]
    pub max_tracked: usize,
}

fn default_min_confidence() -> f32 {
    0.1
}

fn default_min_visible_area() -> u32 {
    5
}

fn default_max_tracking_distance() -> f32 {
    50.0
}

fn default_max_disappeared_frames() -> u32 {
    10
}

fn default_nominal_frame_rate() -> f32 {
    30.0
}

fn default_line_y() -> f32 {
    600.0
}

fn default_max_tracked() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            min_visible_area: default_min_visible_area(),
            max_tracking_distance: default_max_tracking_distance(),
            max_disappeared_frames: default_max_disappeared_frames(),
            nominal_frame_rate: default_nominal_frame_rate(),
            line_y: default_line_y(),
            max_tracked: default_max_tracked(),
        }
    }
}

impl Config {
    /// Load from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let data = fs::read_to_string(path)?;
        let cfg: Config = serde_json::from_str(&data)?;
        Ok(cfg)
    }

    /// Wall-clock budget a track may stay unmatched before aging out.
    pub fn disappear_budget(&self) -> Duration {
        Duration::from_secs_f32(self.max_disappeared_frames as f32 / self.nominal_frame_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_match_tuned_setup() {
        let cfg = Config::default();
        assert_relative_eq!(cfg.max_tracking_distance, 50.0);
        assert_eq!(cfg.max_disappeared_frames, 10);
        assert_relative_eq!(cfg.line_y, 600.0);
        assert_eq!(cfg.max_tracked, 10);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"line_y": 100.0}"#).unwrap();
        assert_relative_eq!(cfg.line_y, 100.0);
        assert_relative_eq!(cfg.min_confidence, 0.1);
        assert_eq!(cfg.max_tracked, 10);
    }

    #[test]
    fn disappear_budget_is_frames_over_rate() {
        let cfg = Config::default();
        // 10 frames at 30 fps
        assert_relative_eq!(cfg.disappear_budget().as_secs_f32(), 1.0 / 3.0, epsilon = 1e-6);
    }
}
