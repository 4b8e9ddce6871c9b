//! The simulation time axis.
//!
//! An `Instant` is a count of seconds since the J2000 epoch held as `f64`.
//! Samples in a timeline are keyed by `Instant`, so it must be totally
//! ordered: comparison goes through `f64::total_cmp`, which also makes
//! equality and hashing agree with ordering.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Sub;

use serde::{Deserialize, Serialize};

/// A point in time, in seconds since J2000.
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instant(f64);

impl Instant {
    /// The J2000 epoch itself.
    pub const J2000: Instant = Instant(0.0);

    /// An instant `seconds` after J2000 (negative is before).
    pub const fn from_seconds(seconds: f64) -> Self {
        Self(seconds)
    }

    /// Seconds since J2000.
    pub const fn seconds_since_j2000(self) -> f64 {
        self.0
    }

    /// The instant `seconds` later than this one.
    pub fn plus_seconds(self, seconds: f64) -> Self {
        Self(self.0 + seconds)
    }
}

impl Default for Instant {
    fn default() -> Self {
        Self::J2000
    }
}

impl PartialEq for Instant {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Instant {}

impl PartialOrd for Instant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Instant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Instant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Elapsed seconds between two instants.
impl Sub for Instant {
    type Output = f64;

    fn sub(self, rhs: Self) -> f64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0.0 {
            write!(f, "J2000{}s", self.0)
        } else {
            write!(f, "J2000+{}s", self.0)
        }
    }
}

impl fmt::Debug for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
