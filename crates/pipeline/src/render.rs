//! Overlay render instructions

use detection::{Detection, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// RGBA color, components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    fn is_valid(&self) -> bool {
        [self.r, self.g, self.b, self.a]
            .iter()
            .all(|c| (0.0..=1.0).contains(c))
    }
}

/// Label to box color mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Colors keyed by model label
    pub colors: HashMap<String, Color>,
    /// Color for labels missing from `colors`
    pub default_color: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: HashMap::new(),
            default_color: Color::RED,
        }
    }
}

impl Palette {
    pub fn with_color(mut self, label: impl Into<String>, color: Color) -> Self {
        self.colors.insert(label.into(), color);
        self
    }

    pub fn color_for(&self, label: &str) -> Color {
        self.colors.get(label).copied().unwrap_or(self.default_color)
    }

    /// Labels whose color has a component outside [0, 1]
    pub fn invalid_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self
            .colors
            .iter()
            .filter(|(_, color)| !color.is_valid())
            .map(|(label, _)| label.as_str())
            .collect();
        if !self.default_color.is_valid() {
            labels.push("<default>");
        }
        labels
    }
}

/// Drawing instruction for the overlay renderer, in frame pixel space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderInstruction {
    DrawBox {
        rect: Rect,
        color: Color,
        label_text: String,
    },
    DrawInferenceTimeLabel {
        text: String,
    },
}

impl RenderInstruction {
    pub fn draw_box(detection: &Detection, palette: &Palette) -> Self {
        RenderInstruction::DrawBox {
            rect: detection.bbox,
            color: palette.color_for(&detection.label),
            label_text: box_label(detection),
        }
    }
}

/// Caption drawn inside a detection box: label, confidence, and box size
pub fn box_label(detection: &Detection) -> String {
    format!(
        "{}\n{:.1}%\nSize: {:.2} x {:.2}",
        capitalize_words(&detection.label),
        detection.confidence * 100.0,
        detection.bbox.width,
        detection.bbox.height
    )
}

pub fn inference_time_label(inference_time: Duration) -> String {
    format!("Inference time: {:.1} ms", inference_time.as_secs_f64() * 1000.0)
}

/// Upper-case the first letter of every word, lower-case the rest
fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start = true;
    for ch in text.chars() {
        if ch.is_whitespace() {
            word_start = true;
            out.push(ch);
        } else if word_start {
            word_start = false;
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car() -> Detection {
        Detection {
            label: "sports car".to_string(),
            confidence: 0.9,
            bbox: Rect::new(320.0, 0.0, 320.0, 240.0),
            area_ratio: 0.25,
        }
    }

    #[test]
    fn test_box_label() {
        assert_eq!(box_label(&car()), "Sports Car\n90.0%\nSize: 320.00 x 240.00");
    }

    #[test]
    fn test_capitalize_words() {
        assert_eq!(capitalize_words("TRAFFIC light"), "Traffic Light");
        assert_eq!(capitalize_words("dog"), "Dog");
        assert_eq!(capitalize_words(""), "");
    }

    #[test]
    fn test_inference_time_label() {
        assert_eq!(
            inference_time_label(Duration::from_micros(12_340)),
            "Inference time: 12.3 ms"
        );
    }

    #[test]
    fn test_palette_lookup() {
        let blue = Color::rgba(0.0, 0.0, 1.0, 1.0);
        let palette = Palette::default().with_color("sports car", blue);

        assert_eq!(palette.color_for("sports car"), blue);
        assert_eq!(palette.color_for("zebra"), Color::RED);

        match RenderInstruction::draw_box(&car(), &palette) {
            RenderInstruction::DrawBox { rect, color, .. } => {
                assert_eq!(rect, car().bbox);
                assert_eq!(color, blue);
            }
            other => panic!("unexpected instruction {:?}", other),
        }
    }

    #[test]
    fn test_invalid_palette_colors() {
        let palette = Palette::default().with_color("car", Color::rgba(2.0, 0.0, 0.0, 1.0));
        assert_eq!(palette.invalid_labels(), vec!["car"]);
        assert!(Palette::default().invalid_labels().is_empty());
    }
}
