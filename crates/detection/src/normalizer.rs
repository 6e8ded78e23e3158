//! Observation normalization

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geometry::{to_screen_rect, FrameContext, Rect};
use crate::observation::{BoxOrigin, Classification, Observation};
use crate::DetectionError;

/// Canonical detection for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Top-confidence label
    pub label: String,

    /// Confidence of that label
    pub confidence: f32,

    /// Box in frame pixels
    pub bbox: Rect,

    /// Box area over frame area, in [0, 1]
    pub area_ratio: f32,
}

/// Highest-confidence label; the first one wins a tie.
pub fn top_label(labels: &[Classification]) -> Option<&Classification> {
    let mut iter = labels.iter();
    let mut best = iter.next()?;
    for candidate in iter {
        if candidate.confidence > best.confidence {
            best = candidate;
        }
    }
    Some(best)
}

/// Normalize a single observation. Returns `Ok(None)` for an observation
/// without labels.
pub fn normalize_one<O: Observation>(
    observation: &O,
    frame: &FrameContext,
) -> Result<Option<Detection>, DetectionError> {
    let Some(label) = top_label(observation.labels()) else {
        return Ok(None);
    };

    let mut normalized_box = observation.bounding_box();
    if observation.origin() == BoxOrigin::TopLeft {
        normalized_box = normalized_box.flip_vertical();
    }

    let bbox = to_screen_rect(&normalized_box, frame)?;
    let area_ratio = (bbox.area() / frame.frame_area()).clamp(0.0, 1.0);

    Ok(Some(Detection {
        label: label.identifier.clone(),
        confidence: label.confidence,
        bbox,
        area_ratio,
    }))
}

/// Lazily normalize a frame's observations, preserving input order.
///
/// Malformed observations are logged and skipped; they never end the frame.
/// The iterator can be cloned to walk the frame again.
pub fn detections<'a, O: Observation>(
    observations: &'a [O],
    frame: &'a FrameContext,
) -> impl Iterator<Item = Detection> + Clone + 'a {
    observations
        .iter()
        .enumerate()
        .filter_map(move |(index, observation)| match normalize_one(observation, frame) {
            Ok(detection) => detection,
            Err(err) => {
                warn!(index, %err, "Skipping malformed observation");
                None
            }
        })
}

/// Normalize a frame's observations into a detection list
pub fn normalize<O: Observation>(observations: &[O], frame: &FrameContext) -> Vec<Detection> {
    detections(observations, frame).collect()
}
