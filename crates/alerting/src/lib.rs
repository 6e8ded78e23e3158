//! Alerting System
//!
//! Provides the per-frame alert policy, alert channel debouncing, and the
//! command/event vocabulary shared with the audio and UI collaborators.

mod debouncer;
mod policy;
mod timestamp;

pub use debouncer::{
    AlertChannel, AlertChannelState, AlertDebouncer, CollaboratorEvent, Command, CueId,
};
pub use policy::{evaluate, AlertEvent, AlertPolicy};
pub use timestamp::Timestamp;

use thiserror::Error;

/// Alerting error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlertError {
    #[error("Configuration error: {0}")]
    Configuration(String),
}
