//! Proximity Alert Pipeline
//!
//! Drives one frame at a time through normalization, alert policy, and
//! debouncing, and emits overlay render instructions plus collaborator
//! commands.

pub mod coordinator;
pub mod render;
pub mod settings;

pub use coordinator::{FrameOutput, Pipeline};
pub use render::{Color, Palette, RenderInstruction};
pub use settings::PipelineSettings;

use alerting::AlertError;
use detection::DetectionError;
use thiserror::Error;

/// Pipeline error types
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Alert(#[from] AlertError),

    #[error("Settings could not be loaded: {0}")]
    Settings(#[from] config::ConfigError),
}
