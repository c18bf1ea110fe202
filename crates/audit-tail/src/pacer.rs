//! Wall-clock pacing for historical replay.
//!
//! When a complete historical log is tailed, every event is available at
//! once. The pacer fixes the lag between "now" and the first event's
//! timestamp, then only releases later events whose age has reached that lag,
//! reproducing the original spacing between events.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

/// Releases replayed events no faster than they originally occurred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayPacer {
    lag: Option<TimeDelta>,
}

impl ReplayPacer {
    /// Creates a pacer that has not seen any event yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { lag: None }
    }

    /// Returns the fixed lag, once the first event has been admitted.
    #[must_use]
    pub const fn lag(&self) -> Option<TimeDelta> {
        self.lag
    }

    /// Decides whether an event stamped `event_time` may be forwarded now.
    pub fn admit(&mut self, event_time: Option<DateTime<Utc>>) -> bool {
        self.admit_at(event_time, Utc::now())
    }

    /// Same as [`ReplayPacer::admit`] against an explicit clock reading.
    ///
    /// Events without a timestamp are always forwarded.
    pub fn admit_at(&mut self, event_time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let Some(event_time) = event_time else {
            return true;
        };
        let age = now - event_time;

        match self.lag {
            Some(lag) => age >= lag,
            None => {
                info!(lag_secs = age.num_seconds(), "replay lag fixed");
                self.lag = Some(age);
                true
            }
        }
    }
}
