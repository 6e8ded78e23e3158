//! Pipeline Replay
//!
//! Feeds recorded model output through the pipeline at its recorded pace
//! and stands in for the audio and UI layers: cues finish (or fail) after a
//! configurable duration and the visual hold timer fires after the policy's
//! hold.

pub mod collaborator;
pub mod recording;

pub use collaborator::SimulatedCollaborator;
pub use recording::{read_recording, replay, RecordedFrame, ReplaySummary};

use anyhow::Context;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging to stderr; stdout carries the replay output
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}
