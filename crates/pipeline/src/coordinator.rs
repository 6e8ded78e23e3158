//! Per-frame pipeline coordinator

use alerting::{evaluate, AlertDebouncer, AlertPolicy, CollaboratorEvent, Command, Timestamp};
use detection::{normalize, FrameContext, Observation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::render::{inference_time_label, Palette, RenderInstruction};
use crate::settings::PipelineSettings;
use crate::PipelineError;

/// Everything the collaborators need for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameOutput {
    /// Overlay instructions, in draw order
    pub render: Vec<RenderInstruction>,
    /// Audio/UI commands, in issue order
    pub commands: Vec<Command>,
}

impl FrameOutput {
    pub fn into_parts(self) -> (Vec<RenderInstruction>, Vec<Command>) {
        (self.render, self.commands)
    }
}

/// Detection-to-alert pipeline for one capture session
///
/// Frames must be handed in one at a time and in capture order. The
/// pipeline owns the session's alert channel state; each session gets its
/// own pipeline.
pub struct Pipeline {
    policy: AlertPolicy,
    palette: Palette,
    debouncer: AlertDebouncer,
    /// Latest model latency reported by the capture layer
    inference_time: Option<Duration>,
    frames_processed: u64,
}

impl Pipeline {
    /// Build a pipeline, rejecting invalid settings up front
    pub fn new(settings: PipelineSettings) -> Result<Self, PipelineError> {
        settings.validate()?;

        info!(
            "Creating pipeline: threshold {}, watching {:?}",
            settings.policy.proximity_threshold, settings.policy.watched_classes
        );

        Ok(Self {
            debouncer: AlertDebouncer::new(&settings.policy),
            policy: settings.policy,
            palette: settings.palette,
            inference_time: None,
            frames_processed: 0,
        })
    }

    /// Process one frame's observations.
    ///
    /// Never fails: malformed observations are skipped, so a bad frame
    /// degrades to a partial or empty render list.
    pub fn process_frame<O: Observation>(
        &mut self,
        observations: &[O],
        frame: &FrameContext,
        now: Timestamp,
    ) -> FrameOutput {
        self.frames_processed += 1;

        let detections = normalize(observations, frame);
        let alerts = evaluate(&detections, &self.policy);
        let commands = self.debouncer.process(&alerts, now);

        let mut render: Vec<RenderInstruction> = detections
            .iter()
            .map(|detection| RenderInstruction::draw_box(detection, &self.palette))
            .collect();

        if !render.is_empty() {
            if let Some(inference_time) = self.inference_time {
                render.push(RenderInstruction::DrawInferenceTimeLabel {
                    text: inference_time_label(inference_time),
                });
            }
        }

        debug!(
            "Frame {}: {} observations, {} detections, {} alerts, {} commands",
            self.frames_processed,
            observations.len(),
            detections.len(),
            alerts.len(),
            commands.len()
        );
        for alert in &alerts {
            debug!("Alert for '{}': {:?}", alert.label(), alert);
        }

        FrameOutput { render, commands }
    }

    /// Feed back a collaborator notification
    pub fn handle_event(&mut self, event: &CollaboratorEvent) -> Option<Command> {
        self.debouncer.handle_event(event)
    }

    /// Record the latest model latency for the inference time label
    pub fn record_inference_time(&mut self, inference_time: Duration) {
        self.inference_time = Some(inference_time);
    }

    pub fn debouncer(&self) -> &AlertDebouncer {
        &self.debouncer
    }
}
