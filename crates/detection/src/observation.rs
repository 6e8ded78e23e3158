//! Raw model observations

use serde::{Deserialize, Serialize};

use crate::geometry::NormalizedRect;

/// One candidate label for an observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Class identifier as reported by the model (e.g. "traffic light")
    pub identifier: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

impl Classification {
    pub fn new(identifier: impl Into<String>, confidence: f32) -> Self {
        Self {
            identifier: identifier.into(),
            confidence,
        }
    }
}

/// Corner the backend measures normalized boxes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxOrigin {
    #[default]
    BottomLeft,
    TopLeft,
}

/// Extraction contract every model backend's object observation satisfies
pub trait Observation {
    /// Candidate labels, in backend order
    fn labels(&self) -> &[Classification];

    /// Normalized bounding box, measured from [`Observation::origin`]
    fn bounding_box(&self) -> NormalizedRect;

    fn origin(&self) -> BoxOrigin {
        BoxOrigin::BottomLeft
    }
}

impl<T: Observation + ?Sized> Observation for &T {
    fn labels(&self) -> &[Classification] {
        (**self).labels()
    }

    fn bounding_box(&self) -> NormalizedRect {
        (**self).bounding_box()
    }

    fn origin(&self) -> BoxOrigin {
        (**self).origin()
    }
}

/// Object observation with labels and a box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedObject {
    pub labels: Vec<Classification>,
    pub bounding_box: NormalizedRect,
    #[serde(default)]
    pub origin: BoxOrigin,
}

impl RecognizedObject {
    pub fn new(labels: Vec<Classification>, bounding_box: NormalizedRect) -> Self {
        Self {
            labels,
            bounding_box,
            origin: BoxOrigin::default(),
        }
    }
}

impl Observation for RecognizedObject {
    fn labels(&self) -> &[Classification] {
        &self.labels
    }

    fn bounding_box(&self) -> NormalizedRect {
        self.bounding_box
    }

    fn origin(&self) -> BoxOrigin {
        self.origin
    }
}

/// Anything a vision request can hand back for a frame
///
/// Only recognized objects carry geometry; everything else is dropped before
/// normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelResult {
    Object(RecognizedObject),
    /// Whole-image classification without a box
    Classification(Classification),
    /// Raw feature tensor output
    FeatureValue,
}

impl ModelResult {
    pub fn as_object(&self) -> Option<&RecognizedObject> {
        match self {
            ModelResult::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Keep only the recognized objects, in order
    pub fn objects(results: &[ModelResult]) -> Vec<&RecognizedObject> {
        results.iter().filter_map(ModelResult::as_object).collect()
    }
}
