//! Monotonic frame timestamps

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Monotonic timestamp (nanoseconds since session start)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp {
    nanos: u64,
}

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp { nanos: 0 };

    pub fn from_millis(millis: u64) -> Self {
        Self {
            nanos: millis.saturating_mul(1_000_000),
        }
    }
}

impl std::ops::Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        let delta = u64::try_from(rhs.as_nanos()).unwrap_or(u64::MAX);
        Timestamp {
            nanos: self.nanos.saturating_add(delta),
        }
    }
}
