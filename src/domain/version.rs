//! Version stamps for tagsets and tag definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Opaque stamp of the last structural change of an entity.
///
/// Two versions compare equal iff no structural change happened between the
/// two observations. Every call to [`Version::new`] yields a value that is
/// distinct from all values generated before it in this process, even when
/// the clock does not advance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    stamp: DateTime<Utc>,
    sequence: u64,
}

impl Version {
    /// Generate a fresh version
    pub fn new() -> Self {
        Version {
            stamp: Utc::now(),
            sequence: SEQUENCE.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn stamp(&self) -> DateTime<Utc> {
        self.stamp
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.stamp.to_rfc3339(), self.sequence)
    }
}
