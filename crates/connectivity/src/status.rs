//! Reachability status and the flip-only state tracker.
//!
//! Pure domain logic - no I/O.

use serde::{Deserialize, Serialize};

/// Raw reachability status reported by a [`crate::ReachabilitySource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PathStatus {
    /// A usable network path exists.
    Satisfied,
    /// No usable network path.
    Unsatisfied,
    /// A path could exist once a connection is brought up (e.g. VPN on demand).
    RequiresConnection,
    /// The source has not determined anything yet.
    #[default]
    Unknown,
}

impl PathStatus {
    /// Only `Satisfied` counts as connectivity.
    pub fn is_satisfied(self) -> bool {
        matches!(self, PathStatus::Satisfied)
    }
}

impl std::fmt::Display for PathStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PathStatus::Satisfied => "satisfied",
            PathStatus::Unsatisfied => "unsatisfied",
            PathStatus::RequiresConnection => "requires_connection",
            PathStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Last known path status, collapsed to a satisfied flag.
///
/// Repeated statuses, and transitions between two non-satisfied statuses,
/// are absorbed so downstream consumers only see real flips.
#[derive(Debug, Clone, Default)]
pub struct PathState {
    last_status: PathStatus,
    satisfied: bool,
    flips: u64,
}

impl PathState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a fresh status. Returns `true` when the satisfied flag flipped.
    pub fn apply(&mut self, status: PathStatus) -> bool {
        self.last_status = status;
        let satisfied = status.is_satisfied();
        if satisfied == self.satisfied {
            return false;
        }
        self.satisfied = satisfied;
        self.flips += 1;
        true
    }

    pub fn is_satisfied(&self) -> bool {
        self.satisfied
    }

    pub fn last_status(&self) -> PathStatus {
        self.last_status
    }

    /// Number of satisfied/unsatisfied flips observed so far.
    pub fn flips(&self) -> u64 {
        self.flips
    }
}
