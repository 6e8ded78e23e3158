//! Detection Normalization
//!
//! Turns raw per-frame model output into canonical detections:
//! - Top-confidence label selection
//! - Model-to-display rotation and mirroring
//! - Pixel-space boxes and frame area ratios

pub mod geometry;
pub mod normalizer;
pub mod observation;

pub use geometry::{to_screen_rect, FrameContext, NormalizedRect, Rect, Rotation};
pub use normalizer::{detections, normalize, top_label, Detection};
pub use observation::{BoxOrigin, Classification, ModelResult, Observation, RecognizedObject};

use thiserror::Error;

/// Detection error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },
}

impl DetectionError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        DetectionError::InvalidGeometry {
            reason: reason.into(),
        }
    }
}
