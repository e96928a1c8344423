use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use nutcount::event_log::JsonlEventLog;
use nutcount::{Config, CountingPipeline, ScriptedDetector};

/// Replay recorded conveyor detections through the tracking and counting
/// core and print the final tallies.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the config JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSONL file of per-frame detection records
    #[arg(long)]
    input: PathBuf,
    /// Optional JSONL crossing-event log to append to
    #[arg(long)]
    event_log: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };

    let mut detector = ScriptedDetector::from_file(&args.input, &cfg)
        .with_context(|| format!("loading detections from {}", args.input.display()))?;
    let mut pipeline = CountingPipeline::new(&cfg);
    let mut event_log = match &args.event_log {
        Some(path) => Some(JsonlEventLog::create(path)?),
        None => None,
    };

    let mut frames = 0u64;
    while let Some(observations) = detector.next_frame() {
        let update = pipeline.process_frame(&observations);
        for event in &update.crossings {
            info!(class = %event.class, id = %event.track_id, "crossed the counting line");
            if let Some(log) = event_log.as_mut() {
                log.record(event)?;
            }
        }
        frames += 1;
    }
    if let Some(log) = event_log.as_mut() {
        log.flush()?;
    }

    let snapshot = pipeline.snapshot();
    info!(frames, total = snapshot.total.total(), "replay finished");
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
