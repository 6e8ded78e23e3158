//! Alert channel debouncing

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::policy::{AlertEvent, AlertPolicy};
use crate::Timestamp;

/// Identifier of an audio cue (e.g. "alert", "red")
pub type CueId = String;

/// Independent debounce track
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertChannel {
    /// Full-screen tint overlay
    Visual,
    /// One audio cue
    Audio(CueId),
}

/// State of one alert channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlertChannelState {
    /// Whether the channel is currently alerting
    pub active: bool,
    /// When the channel last went active
    pub activated_at: Timestamp,
    /// Number of Idle -> Active transitions this session
    pub activations: u64,
}

/// Command for the audio and UI collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    PlayAudio(CueId),
    ShowVisualAlert,
    HideVisualAlert,
}

/// Notification fed back by the collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollaboratorEvent {
    /// Cue played to completion
    PlaybackFinished(CueId),
    /// Cue could not be loaded or decoded
    PlaybackFailed(CueId),
    /// Visual hold timer fired
    VisualHoldElapsed,
}

/// Debouncer guaranteeing at most one concurrent alert per channel
///
/// Each channel is either idle or active. An alert on an idle channel
/// activates it and emits its command once; alerts on an active channel are
/// dropped. Audio channels return to idle when the collaborator reports the
/// cue finished or failed, the visual channel when the collaborator reports
/// its hold timer elapsed. Frame timestamps never release a channel.
pub struct AlertDebouncer {
    /// Cue played for proximity alerts
    proximity_cue: CueId,
    /// Cue played for watched class alerts
    class_cue: CueId,
    /// Channel states, owned by this session only
    channels: HashMap<AlertChannel, AlertChannelState>,
}

impl AlertDebouncer {
    /// Create a new debouncer for a validated policy
    pub fn new(policy: &AlertPolicy) -> Self {
        info!(
            "Creating alert debouncer: hold {:?}, cues {}/{}",
            policy.visual_hold(),
            policy.proximity_cue,
            policy.class_cue
        );
        Self {
            proximity_cue: policy.proximity_cue.clone(),
            class_cue: policy.class_cue.clone(),
            channels: HashMap::new(),
        }
    }

    /// Run one frame's alerts through the channels
    pub fn process(&mut self, events: &[AlertEvent], now: Timestamp) -> Vec<Command> {
        let mut commands = Vec::new();
        for event in events {
            self.on_alert(event, now, &mut commands);
        }
        commands
    }

    /// Route one alert to its channels, appending any resulting commands
    pub fn on_alert(&mut self, event: &AlertEvent, now: Timestamp, commands: &mut Vec<Command>) {
        match event {
            AlertEvent::ProximityAlert { .. } => {
                if self.activate(AlertChannel::Visual, now) {
                    commands.push(Command::ShowVisualAlert);
                }
                let cue = self.proximity_cue.clone();
                if self.activate(AlertChannel::Audio(cue.clone()), now) {
                    commands.push(Command::PlayAudio(cue));
                }
            }
            AlertEvent::ClassAlert { .. } => {
                let cue = self.class_cue.clone();
                if self.activate(AlertChannel::Audio(cue.clone()), now) {
                    commands.push(Command::PlayAudio(cue));
                }
            }
        }
    }

    /// Apply a collaborator notification
    pub fn handle_event(&mut self, event: &CollaboratorEvent) -> Option<Command> {
        match event {
            CollaboratorEvent::PlaybackFinished(cue) => {
                self.release(&AlertChannel::Audio(cue.clone()));
                None
            }
            CollaboratorEvent::PlaybackFailed(cue) => {
                warn!("Playback of cue '{}' failed, channel reset", cue);
                self.release(&AlertChannel::Audio(cue.clone()));
                None
            }
            CollaboratorEvent::VisualHoldElapsed => {
                if self.release(&AlertChannel::Visual) {
                    Some(Command::HideVisualAlert)
                } else {
                    None
                }
            }
        }
    }

    /// Whether a channel is currently active
    pub fn is_active(&self, channel: &AlertChannel) -> bool {
        self.channels.get(channel).map_or(false, |state| state.active)
    }

    /// State of a channel that has been used this session
    pub fn channel_state(&self, channel: &AlertChannel) -> Option<&AlertChannelState> {
        self.channels.get(channel)
    }

    /// Idle -> Active. Returns false if the channel was already active.
    fn activate(&mut self, channel: AlertChannel, now: Timestamp) -> bool {
        let state = self.channels.entry(channel.clone()).or_default();
        if state.active {
            debug!("Alert dropped: {:?} already active", channel);
            return false;
        }

        state.active = true;
        state.activated_at = now;
        state.activations += 1;
        debug!("Channel {:?} active (count: {})", channel, state.activations);
        true
    }

    /// Active -> Idle. Returns false if the channel was already idle.
    fn release(&mut self, channel: &AlertChannel) -> bool {
        match self.channels.get_mut(channel) {
            Some(state) if state.active => {
                state.active = false;
                debug!("Channel {:?} idle", channel);
                true
            }
            _ => false,
        }
    }
}

impl Default for AlertDebouncer {
    fn default() -> Self {
        Self::new(&AlertPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn proximity() -> AlertEvent {
        AlertEvent::ProximityAlert {
            label: "car".to_string(),
            area_ratio: 0.25,
        }
    }

    fn traffic_light() -> AlertEvent {
        AlertEvent::ClassAlert {
            label: "traffic light".to_string(),
        }
    }

    fn play(cue: &str) -> Command {
        Command::PlayAudio(cue.to_string())
    }

    #[test]
    fn test_first_proximity_alert() {
        let mut debouncer = AlertDebouncer::default();
        let commands = debouncer.process(&[proximity()], Timestamp::ZERO);

        assert_eq!(commands, vec![Command::ShowVisualAlert, play("alert")]);
        assert!(debouncer.is_active(&AlertChannel::Visual));
        assert!(debouncer.is_active(&AlertChannel::Audio("alert".to_string())));
    }

    #[test]
    fn test_deduplication() {
        let mut debouncer = AlertDebouncer::default();
        debouncer.process(&[proximity()], Timestamp::ZERO);

        let again = debouncer.process(&[proximity(), proximity()], Timestamp::from_millis(100));
        assert!(again.is_empty());
    }

    #[test]
    fn test_channels_independent() {
        let mut debouncer = AlertDebouncer::default();
        debouncer.process(&[proximity()], Timestamp::ZERO);

        let commands = debouncer.process(&[traffic_light()], Timestamp::from_millis(50));
        assert_eq!(commands, vec![play("red")]);
    }

    #[test]
    fn test_playback_finished_rearms() {
        let mut debouncer = AlertDebouncer::default();
        debouncer.process(&[traffic_light()], Timestamp::ZERO);

        assert_eq!(
            debouncer.handle_event(&CollaboratorEvent::PlaybackFinished("red".to_string())),
            None
        );
        let commands = debouncer.process(&[traffic_light()], Timestamp::from_millis(10));
        assert_eq!(commands, vec![play("red")]);
        assert_eq!(
            debouncer
                .channel_state(&AlertChannel::Audio("red".to_string()))
                .unwrap()
                .activations,
            2
        );
    }

    #[test]
    fn test_playback_failed_rearms() {
        let mut debouncer = AlertDebouncer::default();
        debouncer.process(&[proximity()], Timestamp::ZERO);
        debouncer.handle_event(&CollaboratorEvent::PlaybackFailed("alert".to_string()));

        // Visual is still held, only the audio retries
        let commands = debouncer.process(&[proximity()], Timestamp::from_millis(20));
        assert_eq!(commands, vec![play("alert")]);
    }

    #[test]
    fn test_visual_hold_elapsed_event() {
        let mut debouncer = AlertDebouncer::default();
        debouncer.process(&[proximity()], Timestamp::ZERO);

        assert_eq!(
            debouncer.handle_event(&CollaboratorEvent::VisualHoldElapsed),
            Some(Command::HideVisualAlert)
        );
        // Stale timer on an idle channel is a no-op
        assert_eq!(debouncer.handle_event(&CollaboratorEvent::VisualHoldElapsed), None);
        assert!(debouncer.is_active(&AlertChannel::Audio("alert".to_string())));
    }

    #[test]
    fn test_visual_held_until_timer_event() {
        let mut debouncer = AlertDebouncer::default();
        debouncer.process(&[proximity()], Timestamp::ZERO);

        // Frames past the hold length do not release the tint
        assert!(debouncer.process(&[], Timestamp::from_millis(1_500)).is_empty());
        assert!(debouncer.is_active(&AlertChannel::Visual));

        debouncer.handle_event(&CollaboratorEvent::PlaybackFinished("alert".to_string()));
        assert_eq!(
            debouncer.process(&[proximity()], Timestamp::from_millis(2_000)),
            vec![play("alert")]
        );

        assert_eq!(
            debouncer.handle_event(&CollaboratorEvent::VisualHoldElapsed),
            Some(Command::HideVisualAlert)
        );
        assert_eq!(
            debouncer.process(&[proximity()], Timestamp::from_millis(2_100)),
            vec![Command::ShowVisualAlert]
        );
    }

    proptest! {
        #[test]
        fn prop_one_play_per_activation(offsets in prop::collection::vec(0u64..10_000, 1..64)) {
            let mut debouncer = AlertDebouncer::default();
            let mut now = Timestamp::ZERO;
            let mut plays = 0;

            for offset in offsets {
                now = now + Duration::from_millis(offset);
                plays += debouncer
                    .process(&[traffic_light()], now)
                    .iter()
                    .filter(|c| **c == play("red"))
                    .count();
            }

            prop_assert_eq!(plays, 1);
        }
    }
}
