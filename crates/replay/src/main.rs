//! Proximity Alert Replay - Main Entry Point

use anyhow::Context;
use clap::Parser;
use detection::{FrameContext, Rotation};
use pipeline::{Pipeline, PipelineSettings};
use replay::{init_logging, read_recording, replay, SimulatedCollaborator};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Replay recorded detections through the proximity alert pipeline
#[derive(Parser, Debug)]
#[command(name = "proximity-replay", version, about)]
struct Args {
    /// JSON-lines recording of model output
    #[arg(long)]
    input: PathBuf,

    /// Pipeline settings file (TOML, JSON, or YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 640)]
    frame_width: u32,

    #[arg(long, default_value_t = 480)]
    frame_height: u32,

    /// Model-to-display rotation in degrees (0, 90, 180, 270)
    #[arg(long, default_value_t = 90)]
    rotation: u32,

    /// Mirror the display horizontally
    #[arg(long)]
    mirror: bool,

    /// Simulated playback length of every audio cue
    #[arg(long, default_value_t = 800)]
    cue_duration_ms: u64,

    /// Simulate a decode failure for this cue (repeatable)
    #[arg(long)]
    fail_cue: Vec<String>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    info!("=== Proximity Alert Replay v{} ===", env!("CARGO_PKG_VERSION"));

    let rotation = Rotation::from_degrees(args.rotation)
        .with_context(|| format!("unsupported rotation {} degrees", args.rotation))?;
    let frame_context = FrameContext::new(args.frame_width, args.frame_height, rotation, args.mirror)?;

    let settings = PipelineSettings::load(args.config.as_deref())?;
    let visual_hold = settings.policy.visual_hold();
    let mut pipeline = Pipeline::new(settings)?;
    let mut collaborator = args.fail_cue.iter().fold(
        SimulatedCollaborator::new(Duration::from_millis(args.cue_duration_ms), visual_hold),
        |collaborator, cue| collaborator.fail_cue(cue.as_str()),
    );

    let file = File::open(&args.input)
        .with_context(|| format!("opening recording {}", args.input.display()))?;
    let frames = read_recording(BufReader::new(file))?;
    info!("Replaying {} frames from {}", frames.len(), args.input.display());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    replay(&frames, &frame_context, &mut pipeline, &mut collaborator, &mut out).await?;

    Ok(())
}
