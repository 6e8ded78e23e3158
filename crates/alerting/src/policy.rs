//! Per-frame alert policy

use detection::Detection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

use crate::AlertError;

/// Alert policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPolicy {
    /// Frame area fraction above which a detection is "close" (default: 0.15)
    pub proximity_threshold: f32,
    /// How long the visual tint stays up after a proximity alert (default: 1.0s)
    pub proximity_hold_seconds: f32,
    /// Class names that always alert, matched case-insensitively as substrings
    pub watched_classes: BTreeSet<String>,
    /// Audio cue for proximity alerts (default: "alert")
    pub proximity_cue: String,
    /// Audio cue for watched class alerts (default: "red")
    pub class_cue: String,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            proximity_threshold: 0.15,
            proximity_hold_seconds: 1.0,
            watched_classes: BTreeSet::from(["traffic light".to_string()]),
            proximity_cue: "alert".to_string(),
            class_cue: "red".to_string(),
        }
    }
}

impl AlertPolicy {
    /// Check the policy before a pipeline is built from it
    pub fn validate(&self) -> Result<(), AlertError> {
        if !(0.0..1.0).contains(&self.proximity_threshold) {
            return Err(AlertError::Configuration(format!(
                "proximity_threshold must be in [0, 1), got {}",
                self.proximity_threshold
            )));
        }
        let hold = Duration::try_from_secs_f32(self.proximity_hold_seconds).map_err(|e| {
            AlertError::Configuration(format!(
                "proximity_hold_seconds {} is not a valid duration: {}",
                self.proximity_hold_seconds, e
            ))
        })?;
        if hold.is_zero() {
            return Err(AlertError::Configuration(format!(
                "proximity_hold_seconds must be positive, got {}",
                self.proximity_hold_seconds
            )));
        }
        if self.watched_classes.iter().any(|c| c.trim().is_empty()) {
            return Err(AlertError::Configuration(
                "watched_classes must not contain blank entries".to_string(),
            ));
        }
        if self.proximity_cue.trim().is_empty() || self.class_cue.trim().is_empty() {
            return Err(AlertError::Configuration("audio cue names must not be blank".to_string()));
        }
        if self.proximity_cue == self.class_cue {
            return Err(AlertError::Configuration(format!(
                "proximity_cue and class_cue must differ, both are '{}'",
                self.class_cue
            )));
        }
        Ok(())
    }

    /// Visual hold as a duration, zero if the policy has not been validated
    /// and the hold does not fit in one
    pub fn visual_hold(&self) -> Duration {
        Duration::try_from_secs_f32(self.proximity_hold_seconds).unwrap_or(Duration::ZERO)
    }

    /// Whether `label` names a watched class
    pub fn is_watched(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.watched_classes
            .iter()
            .any(|class| label.contains(&class.to_lowercase()))
    }
}

/// Alert raised by the policy for one detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlertEvent {
    /// Object fills more than the proximity threshold of the frame
    ProximityAlert { label: String, area_ratio: f32 },

    /// Object belongs to a watched class
    ClassAlert { label: String },
}

impl AlertEvent {
    pub fn label(&self) -> &str {
        match self {
            AlertEvent::ProximityAlert { label, .. } | AlertEvent::ClassAlert { label } => label,
        }
    }
}

/// Evaluate one frame's detections against the policy.
///
/// Stateless: every qualifying detection produces its events, in detection
/// order, with the proximity alert ahead of the class alert.
pub fn evaluate(detections: &[Detection], policy: &AlertPolicy) -> Vec<AlertEvent> {
    let mut events = Vec::new();

    for detection in detections {
        if detection.area_ratio > policy.proximity_threshold {
            debug!(
                "Proximity: {} covers {:.3} of frame",
                detection.label, detection.area_ratio
            );
            events.push(AlertEvent::ProximityAlert {
                label: detection.label.clone(),
                area_ratio: detection.area_ratio,
            });
        }

        if policy.is_watched(&detection.label) {
            debug!("Watched class: {}", detection.label);
            events.push(AlertEvent::ClassAlert {
                label: detection.label.clone(),
            });
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use detection::Rect;

    fn detection(label: &str, area_ratio: f32) -> Detection {
        Detection {
            label: label.to_string(),
            confidence: 0.9,
            bbox: Rect::default(),
            area_ratio,
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = AlertPolicy::default();
        assert_eq!(policy.proximity_threshold, 0.15);
        assert_eq!(policy.visual_hold(), Duration::from_secs(1));
        assert!(policy.watched_classes.contains("traffic light"));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_threshold_is_strict() {
        let policy = AlertPolicy::default();

        assert!(evaluate(&[detection("car", 0.15)], &policy).is_empty());

        let above = 0.15f32 + f32::EPSILON;
        assert_eq!(
            evaluate(&[detection("car", above)], &policy),
            vec![AlertEvent::ProximityAlert {
                label: "car".to_string(),
                area_ratio: above,
            }]
        );
    }

    #[test]
    fn test_class_match_case_insensitive() {
        let policy = AlertPolicy::default();
        let events = evaluate(&[detection("Traffic Light", 0.01)], &policy);

        assert_eq!(
            events,
            vec![AlertEvent::ClassAlert {
                label: "Traffic Light".to_string()
            }]
        );
    }

    #[test]
    fn test_class_match_substring() {
        let policy = AlertPolicy::default();
        assert!(policy.is_watched("traffic light (red)"));
        assert!(!policy.is_watched("traffic"));

        let mut shouting = AlertPolicy::default();
        shouting.watched_classes = BTreeSet::from(["STOP SIGN".to_string()]);
        assert!(shouting.is_watched("stop sign"));
    }

    #[test]
    fn test_both_rules_ordered() {
        let policy = AlertPolicy::default();
        let events = evaluate(
            &[detection("traffic light", 0.5), detection("car", 0.3)],
            &policy,
        );

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], AlertEvent::ProximityAlert { ref label, .. } if label == "traffic light"));
        assert!(matches!(events[1], AlertEvent::ClassAlert { ref label } if label == "traffic light"));
        assert!(matches!(events[2], AlertEvent::ProximityAlert { ref label, .. } if label == "car"));
    }

    #[test]
    fn test_no_suppression_within_frame() {
        let policy = AlertPolicy::default();
        let events = evaluate(&[detection("car", 0.4), detection("car", 0.4)], &policy);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_invalid_policies() {
        let bad_threshold = AlertPolicy {
            proximity_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(bad_threshold.validate(), Err(AlertError::Configuration(_))));

        let bad_hold = AlertPolicy {
            proximity_hold_seconds: 0.0,
            ..Default::default()
        };
        assert!(bad_hold.validate().is_err());

        let blank_class = AlertPolicy {
            watched_classes: BTreeSet::from([" ".to_string()]),
            ..Default::default()
        };
        assert!(blank_class.validate().is_err());

        let blank_cue = AlertPolicy {
            class_cue: String::new(),
            ..Default::default()
        };
        assert!(blank_cue.validate().is_err());
    }

    #[test]
    fn test_hold_must_fit_duration() {
        for seconds in [1e20, f32::INFINITY, f32::NAN, -1.0] {
            let policy = AlertPolicy {
                proximity_hold_seconds: seconds,
                ..Default::default()
            };
            assert!(matches!(policy.validate(), Err(AlertError::Configuration(_))));
            assert_eq!(policy.visual_hold(), Duration::ZERO);
        }

        let long = AlertPolicy {
            proximity_hold_seconds: 3600.0,
            ..Default::default()
        };
        assert!(long.validate().is_ok());
        assert_eq!(long.visual_hold(), Duration::from_secs(3600));
    }

    #[test]
    fn test_shared_cue_rejected() {
        let shared = AlertPolicy {
            proximity_cue: "beep".to_string(),
            class_cue: "beep".to_string(),
            ..Default::default()
        };
        assert!(matches!(shared.validate(), Err(AlertError::Configuration(_))));
    }
}
