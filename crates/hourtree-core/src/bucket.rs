//! Hour bucket derivation
//!
//! Buckets count whole hours since the Unix epoch. Two timestamps inside
//! the same UTC hour map to the same bucket, and buckets grow
//! monotonically with wall-clock time. The bucket containing "now" is the
//! one the assembly run excludes from publication.

use chrono::{DateTime, Utc};
use std::fmt;

const SECONDS_PER_HOUR: i64 = 3_600;

/// Discrete one-hour time window, counted from the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourBucket(i64);

impl HourBucket {
    /// Bucket containing the given instant.
    pub fn of(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp.timestamp().div_euclid(SECONDS_PER_HOUR))
    }

    /// Bucket containing "now", sampled at call time on the same UTC
    /// basis as [`HourBucket::of`].
    pub fn current() -> Self {
        Self::of(Utc::now())
    }

    pub fn from_index(index: i64) -> Self {
        Self(index)
    }

    pub fn index(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for HourBucket {
    /// Canonical decimal form, also used for path names.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
