use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::Error;
use crate::tracker::CrossingEvent;

#[derive(Debug, Serialize)]
struct EventRecord<'a> {
    /// Unix timestamp, seconds.
    timestamp: f64,
    track_id: String,
    label: &'a str,
    x: f32,
    y: f32,
}

/// Append-only JSONL log of crossing events, one record per line. A pure
/// observer: counting is correct whether or not a log is attached.
pub struct JsonlEventLog {
    out: BufWriter<File>,
}

impl JsonlEventLog {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::create(path)?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }

    pub fn record(&mut self, event: &CrossingEvent) -> Result<(), Error> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        let record = EventRecord {
            timestamp,
            track_id: event.track_id.to_string(),
            label: event.class.label(),
            x: event.position.x,
            y: event.position.y,
        };
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::NutClass;
    use nalgebra::Point2;
    use uuid::Uuid;

    #[test]
    fn records_are_one_json_object_per_line() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("nutcount_log_{}.jsonl", Uuid::new_v4()));

        let mut log = JsonlEventLog::create(&path).unwrap();
        for class in [NutClass::M6, NutClass::M10] {
            log.record(&CrossingEvent {
                track_id: Uuid::new_v4(),
                class,
                position: Point2::new(320.0, 601.0),
            })
            .unwrap();
        }
        log.flush().unwrap();

        let data = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = data.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["label"], "m6");
        assert_eq!(first["y"], 601.0);
        assert!(first["timestamp"].as_f64().unwrap() > 0.0);

        std::fs::remove_file(&path).ok();
    }
}
