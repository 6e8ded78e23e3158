//! Model-space to screen-space geometry
//!
//! Models report boxes in normalized [0, 1] coordinates of the image they
//! consumed, with a bottom-left origin. The overlay renderer works in pixel
//! coordinates of the captured frame, possibly rotated and mirrored relative
//! to the model input.

use serde::{Deserialize, Serialize};

use crate::DetectionError;

/// Axis-aligned rectangle in pixel units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Bounding box in normalized model coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Reject boxes the transform cannot place.
    ///
    /// Origins may legitimately fall slightly outside [0, 1] near the frame
    /// edges, so only non-finite values and negative extents are errors.
    pub fn validate(&self) -> Result<(), DetectionError> {
        let values = [self.x, self.y, self.width, self.height];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DetectionError::invalid(format!(
                "non-finite box component in {:?}",
                values
            )));
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(DetectionError::invalid(format!(
                "negative box extent {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Move the origin from the top-left corner to the bottom-left corner
    /// (the flip is its own inverse).
    pub fn flip_vertical(&self) -> Self {
        Self {
            y: 1.0 - self.y - self.height,
            ..*self
        }
    }

    /// Mirror across the vertical center line
    pub fn flip_horizontal(&self) -> Self {
        Self {
            x: 1.0 - self.x - self.width,
            ..*self
        }
    }

    /// Rotate the box clockwise by `rotation` inside the unit square
    pub fn rotated(&self, rotation: Rotation) -> Self {
        let Self { x, y, width, height } = *self;
        match rotation {
            Rotation::Deg0 => *self,
            Rotation::Deg90 => Self::new(1.0 - y - height, x, height, width),
            Rotation::Deg180 => Self::new(1.0 - x - width, 1.0 - y - height, width, height),
            Rotation::Deg270 => Self::new(y, 1.0 - x - width, height, width),
        }
    }
}

/// Rotation between the model input orientation and the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    Deg0,
    /// Portrait model input from a landscape sensor
    #[default]
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Whether width and height trade places under this rotation
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// Per-session capture geometry
///
/// Fixed when the capture session is configured and reused for every frame.
/// A zero-sized frame is rejected here so that no session can start with
/// impossible geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    frame_width: u32,
    frame_height: u32,
    rotation: Rotation,
    mirror: bool,
}

impl FrameContext {
    pub fn new(
        frame_width: u32,
        frame_height: u32,
        rotation: Rotation,
        mirror: bool,
    ) -> Result<Self, DetectionError> {
        if frame_width == 0 || frame_height == 0 {
            return Err(DetectionError::invalid(format!(
                "frame must be non-empty, got {}x{}",
                frame_width, frame_height
            )));
        }
        Ok(Self {
            frame_width,
            frame_height,
            rotation,
            mirror,
        })
    }

    pub fn frame_width(&self) -> u32 {
        self.frame_width
    }

    pub fn frame_height(&self) -> u32 {
        self.frame_height
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn mirror(&self) -> bool {
        self.mirror
    }

    /// Frame area in square pixels
    pub fn frame_area(&self) -> f32 {
        self.frame_width as f32 * self.frame_height as f32
    }

    /// Scale that makes the overlay fill a `view_width` x `view_height` view
    /// while preserving aspect ratio (excess is cropped, never letterboxed).
    pub fn aspect_fill_scale(&self, view_width: f32, view_height: f32) -> Result<f32, DetectionError> {
        if !(view_width > 0.0 && view_height > 0.0) || !view_width.is_finite() || !view_height.is_finite() {
            return Err(DetectionError::invalid(format!(
                "view must be non-empty, got {}x{}",
                view_width, view_height
            )));
        }

        let (displayed_width, displayed_height) = if self.rotation.swaps_axes() {
            (self.frame_height as f32, self.frame_width as f32)
        } else {
            (self.frame_width as f32, self.frame_height as f32)
        };

        Ok((view_width / displayed_width).max(view_height / displayed_height))
    }
}

/// Map a normalized, bottom-left origin model box into frame pixels.
///
/// The box is rotated into display orientation, optionally mirrored, then
/// scaled by the frame size. The result is not clamped to the frame.
pub fn to_screen_rect(normalized_box: &NormalizedRect, frame: &FrameContext) -> Result<Rect, DetectionError> {
    normalized_box.validate()?;
    if frame.frame_width == 0 || frame.frame_height == 0 {
        return Err(DetectionError::invalid("zero-sized frame"));
    }

    let mut display = normalized_box.rotated(frame.rotation);
    if frame.mirror {
        display = display.flip_horizontal();
    }

    let width = frame.frame_width as f32;
    let height = frame.frame_height as f32;

    Ok(Rect {
        x: display.x * width,
        y: display.y * height,
        width: display.width * width,
        height: display.height * height,
    })
}
