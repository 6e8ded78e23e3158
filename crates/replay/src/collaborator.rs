//! Simulated audio and UI collaborators

use alerting::{CollaboratorEvent, Command, CueId};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Audio player and tint overlay stand-in
///
/// Turns pipeline commands into timed notifications: a played cue reports
/// `PlaybackFinished` after `cue_duration` (or `PlaybackFailed` right away
/// for a failing cue), and showing the tint arms the visual hold timer.
pub struct SimulatedCollaborator {
    cue_duration: Duration,
    visual_hold: Duration,
    failing_cues: HashSet<CueId>,
    /// Pending notifications keyed by (due, sequence)
    pending: BTreeMap<(Instant, u64), CollaboratorEvent>,
    next_seq: u64,
    tint_visible: bool,
}

impl SimulatedCollaborator {
    pub fn new(cue_duration: Duration, visual_hold: Duration) -> Self {
        Self {
            cue_duration,
            visual_hold,
            failing_cues: HashSet::new(),
            pending: BTreeMap::new(),
            next_seq: 0,
            tint_visible: false,
        }
    }

    /// Make every playback of `cue` fail to decode
    pub fn fail_cue(mut self, cue: impl Into<CueId>) -> Self {
        self.failing_cues.insert(cue.into());
        self
    }

    /// Carry out a command issued at `now`
    pub fn execute(&mut self, command: &Command, now: Instant) {
        match command {
            Command::PlayAudio(cue) if self.failing_cues.contains(cue) => {
                debug!("Cue '{}' failed to decode", cue);
                self.schedule(now, CollaboratorEvent::PlaybackFailed(cue.clone()));
            }
            Command::PlayAudio(cue) => {
                debug!("Playing cue '{}'", cue);
                self.schedule(now + self.cue_duration, CollaboratorEvent::PlaybackFinished(cue.clone()));
            }
            Command::ShowVisualAlert => {
                self.tint_visible = true;
                self.schedule(now + self.visual_hold, CollaboratorEvent::VisualHoldElapsed);
            }
            Command::HideVisualAlert => {
                self.tint_visible = false;
            }
        }
    }

    /// When the earliest pending notification is due
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    /// Remove and return every notification due at or before `now`, in order
    pub fn take_due(&mut self, now: Instant) -> Vec<CollaboratorEvent> {
        let later = self.pending.split_off(&(now, u64::MAX));
        let due = std::mem::replace(&mut self.pending, later);
        due.into_values().collect()
    }

    /// When the latest pending notification is due
    pub fn pending_horizon(&self) -> Option<Instant> {
        self.pending.keys().next_back().map(|(due, _)| *due)
    }

    pub fn tint_visible(&self) -> bool {
        self.tint_visible
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn schedule(&mut self, due: Instant, event: CollaboratorEvent) {
        self.pending.insert((due, self.next_seq), event);
        self.next_seq += 1;
    }
}
