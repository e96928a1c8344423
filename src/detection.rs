use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;
use crate::error::Error;

/// The closed set of thread sizes the classifier was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutClass {
    M6,
    M8,
    M10,
    M12,
}

impl NutClass {
    pub const ALL: [NutClass; 4] = [NutClass::M6, NutClass::M8, NutClass::M10, NutClass::M12];

    pub fn label(&self) -> &'static str {
        match self {
            NutClass::M6 => "m6",
            NutClass::M8 => "m8",
            NutClass::M10 => "m10",
            NutClass::M12 => "m12",
        }
    }
}

impl fmt::Display for NutClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NutClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m6" => Ok(NutClass::M6),
            "m8" => Ok(NutClass::M8),
            "m10" => Ok(NutClass::M10),
            "m12" => Ok(NutClass::M12),
            other => Err(Error::UnknownClass(other.to_string())),
        }
    }
}

/// One per-frame, per-class detection. Position is the classifier's single
/// best-estimate point in camera pixel space (origin top-left, y downward).
/// Confidence has already been filtered against the configured floor by the
/// time an observation reaches the tracker.
#[derive(Debug, Clone)]
pub struct Observation {
    pub class: NutClass,
    pub position: Point2<f32>,
    pub confidence: f32,
}

impl Observation {
    pub fn new(class: NutClass, x: f32, y: f32, confidence: f32) -> Self {
        Self {
            class,
            position: Point2::new(x, y),
            confidence,
        }
    }
}

/// Serialized form of one detection in a replay file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
    /// Activated model-cell area, when the capture tooling recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<u32>,
}

/// One line of a replay file: the full detection list for a single frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame: u64,
    pub observations: Vec<ObservationRecord>,
}

/// File-replay stand-in for the camera + classifier pipeline. Reads JSONL
/// frame records and applies the detector-side contract: confidence and
/// visible-area floors are enforced here, never re-checked downstream, and
/// records with an unrecognized label are dropped with a warning.
pub struct ScriptedDetector {
    frames: VecDeque<Vec<Observation>>,
    min_confidence: f32,
    min_visible_area: u32,
}

impl ScriptedDetector {
    pub fn from_file<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self, Error> {
        let data = fs::read_to_string(path)?;
        let mut frames = VecDeque::new();
        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: FrameRecord = serde_json::from_str(line)?;
            frames.push_back(record);
        }
        Ok(Self::from_records(frames.into_iter(), config))
    }

    pub fn from_records<I>(records: I, config: &Config) -> Self
    where
        I: IntoIterator<Item = FrameRecord>,
    {
        let min_confidence = config.min_confidence;
        let min_visible_area = config.min_visible_area;
        let frames = records
            .into_iter()
            .map(|record| filter_frame(record, min_confidence, min_visible_area))
            .collect();
        Self {
            frames,
            min_confidence,
            min_visible_area,
        }
    }

    /// Detections for the next frame, or `None` once the replay is exhausted.
    /// An empty vec is a normal no-detections frame.
    pub fn next_frame(&mut self) -> Option<Vec<Observation>> {
        self.frames.pop_front()
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    pub fn min_visible_area(&self) -> u32 {
        self.min_visible_area
    }
}

fn filter_frame(record: FrameRecord, min_confidence: f32, min_visible_area: u32) -> Vec<Observation> {
    let frame = record.frame;
    record
        .observations
        .into_iter()
        .filter_map(|obs| {
            let class = match obs.label.parse::<NutClass>() {
                Ok(class) => class,
                Err(_) => {
                    warn!(frame, label = %obs.label, "dropping observation with unknown class");
                    return None;
                }
            };
            if obs.confidence < min_confidence {
                return None;
            }
            if let Some(area) = obs.area {
                if area < min_visible_area {
                    return None;
                }
            }
            Some(Observation::new(class, obs.x, obs.y, obs.confidence))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(frame: u64, obs: Vec<ObservationRecord>) -> FrameRecord {
        FrameRecord {
            frame,
            observations: obs,
        }
    }

    fn obs(label: &str, y: f32, confidence: f32) -> ObservationRecord {
        ObservationRecord {
            label: label.to_string(),
            x: 320.0,
            y,
            confidence,
            area: None,
        }
    }

    #[test]
    fn class_labels_round_trip() {
        for class in NutClass::ALL {
            assert_eq!(class.label().parse::<NutClass>().unwrap(), class);
        }
        assert!(matches!(
            "m14".parse::<NutClass>(),
            Err(Error::UnknownClass(_))
        ));
    }

    #[test]
    fn unknown_label_is_dropped_not_fatal() {
        let mut det = ScriptedDetector::from_records(
            [record(0, vec![obs("m6", 100.0, 0.9), obs("hexbolt", 100.0, 0.9)])],
            &Config::default(),
        );
        let frame = det.next_frame().unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame[0].class, NutClass::M6);
    }

    #[test]
    fn confidence_floor_applies_before_tracking() {
        let mut det = ScriptedDetector::from_records(
            [record(0, vec![obs("m8", 100.0, 0.05), obs("m8", 100.0, 0.5)])],
            &Config::default(),
        );
        let frame = det.next_frame().unwrap();
        assert_eq!(frame.len(), 1);
        assert!(frame[0].confidence >= 0.1);
    }

    #[test]
    fn small_visible_area_is_filtered() {
        let mut low = obs("m10", 100.0, 0.9);
        low.area = Some(2);
        let mut ok = obs("m10", 100.0, 0.9);
        ok.area = Some(9);
        let mut det =
            ScriptedDetector::from_records([record(0, vec![low, ok])], &Config::default());
        assert_eq!(det.next_frame().unwrap().len(), 1);
    }

    #[test]
    fn exhausted_replay_returns_none() {
        let mut det = ScriptedDetector::from_records([record(0, vec![])], &Config::default());
        // empty frame is a normal frame, not end-of-stream
        assert_eq!(det.next_frame().unwrap().len(), 0);
        assert!(det.next_frame().is_none());
    }
}
