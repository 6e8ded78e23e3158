//! Recorded frame input and the replay loop

use alerting::{CollaboratorEvent, Command, Timestamp};
use anyhow::Context;
use detection::{FrameContext, ModelResult};
use pipeline::{Pipeline, RenderInstruction};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{info, warn};

use crate::collaborator::SimulatedCollaborator;

/// One recorded frame of model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Capture time relative to the start of the recording
    pub timestamp_ms: u64,
    /// Model latency for this frame
    #[serde(default)]
    pub inference_ms: Option<f32>,
    /// Everything the model returned
    #[serde(default)]
    pub results: Vec<ModelResult>,
}

/// One line of replay output
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReplayRecord<'a> {
    Frame {
        timestamp_ms: u64,
        render: &'a [RenderInstruction],
        commands: &'a [Command],
    },
    Event {
        at_ms: u64,
        event: &'a CollaboratorEvent,
        command: Option<&'a Command>,
    },
}

/// Totals for a finished replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: usize,
    pub boxes: usize,
    pub commands: usize,
    pub events: usize,
}

/// Parse a JSON-lines recording, skipping blank lines
pub fn read_recording<R: BufRead>(reader: R) -> anyhow::Result<Vec<RecordedFrame>> {
    let mut frames = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", index + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: RecordedFrame =
            serde_json::from_str(&line).with_context(|| format!("parsing frame on line {}", index + 1))?;
        frames.push(frame);
    }

    if frames.windows(2).any(|pair| pair[1].timestamp_ms < pair[0].timestamp_ms) {
        anyhow::bail!("recording timestamps must not go backwards");
    }
    Ok(frames)
}

/// Replay frames at their recorded pace, writing one JSON line per frame
/// and per collaborator notification.
pub async fn replay<W: Write>(
    frames: &[RecordedFrame],
    frame_context: &FrameContext,
    pipeline: &mut Pipeline,
    collaborator: &mut SimulatedCollaborator,
    out: &mut W,
) -> anyhow::Result<ReplaySummary> {
    let start = Instant::now();
    let mut summary = ReplaySummary::default();

    for frame in frames {
        let due = start + Duration::from_millis(frame.timestamp_ms);
        deliver_until(due, start, pipeline, collaborator, out, &mut summary).await?;
        sleep_until(due).await;

        if let Some(ms) = frame.inference_ms {
            match Duration::try_from_secs_f32(ms / 1000.0) {
                Ok(inference_time) => pipeline.record_inference_time(inference_time),
                Err(e) => warn!("Ignoring invalid inference time {} ms: {}", ms, e),
            }
        }

        let objects = ModelResult::objects(&frame.results);
        let output = pipeline.process_frame(&objects, frame_context, Timestamp::from_millis(frame.timestamp_ms));
        for command in &output.commands {
            collaborator.execute(command, due);
        }

        summary.frames += 1;
        summary.boxes += output
            .render
            .iter()
            .filter(|r| matches!(r, RenderInstruction::DrawBox { .. }))
            .count();
        summary.commands += output.commands.len();

        write_record(
            out,
            &ReplayRecord::Frame {
                timestamp_ms: frame.timestamp_ms,
                render: &output.render,
                commands: &output.commands,
            },
        )?;
    }

    // Let playing cues and the tint run out
    while let Some(last) = collaborator.pending_horizon() {
        deliver_until(last, start, pipeline, collaborator, out, &mut summary).await?;
    }

    info!(
        "Replay finished: {} frames, {} boxes, {} commands, {} events",
        summary.frames, summary.boxes, summary.commands, summary.events
    );
    Ok(summary)
}

/// Deliver collaborator notifications due at or before `until`
async fn deliver_until<W: Write>(
    until: Instant,
    start: Instant,
    pipeline: &mut Pipeline,
    collaborator: &mut SimulatedCollaborator,
    out: &mut W,
    summary: &mut ReplaySummary,
) -> anyhow::Result<()> {
    while let Some(at) = collaborator.next_due().filter(|at| *at <= until) {
        sleep_until(at).await;
        for event in collaborator.take_due(at) {
            let command = pipeline.handle_event(&event);
            if let Some(command) = &command {
                collaborator.execute(command, at);
                summary.commands += 1;
            }
            summary.events += 1;

            let at_ms = u64::try_from(at.duration_since(start).as_millis()).unwrap_or(u64::MAX);
            write_record(
                out,
                &ReplayRecord::Event {
                    at_ms,
                    event: &event,
                    command: command.as_ref(),
                },
            )?;
        }
    }
    Ok(())
}

fn write_record<W: Write>(out: &mut W, record: &ReplayRecord<'_>) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, record)?;
    writeln!(out)?;
    Ok(())
}
