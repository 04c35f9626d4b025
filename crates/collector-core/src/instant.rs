//! Monotonic points in time.

use std::ops::{Add, Sub};
use std::time::Duration;

/// A point on the monotonic clock.
///
/// Instants are only meaningful relative to each other: the wire format never
/// carries an absolute time, only offsets from the start of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(std::time::Instant);

impl Instant {
    /// Reads the monotonic clock.
    pub fn now() -> Self {
        Self(std::time::Instant::now())
    }

    /// Signed number of seconds from `origin` to `self`.
    ///
    /// Negative when `self` precedes `origin`.
    pub fn seconds_since(self, origin: Instant) -> f64 {
        if self >= origin {
            (self.0 - origin.0).as_secs_f64()
        } else {
            -(origin.0 - self.0).as_secs_f64()
        }
    }

    /// `self + duration`, or `None` when the result is not representable.
    pub fn checked_add(self, duration: Duration) -> Option<Instant> {
        self.0.checked_add(duration).map(Instant)
    }
}

impl Sub for Instant {
    type Output = Duration;

    /// Elapsed time from `rhs` to `self`, zero if `rhs` is later.
    fn sub(self, rhs: Instant) -> Duration {
        self.0.saturating_duration_since(rhs.0)
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        Instant(self.0 + rhs)
    }
}

impl From<std::time::Instant> for Instant {
    fn from(instant: std::time::Instant) -> Self {
        Self(instant)
    }
}
