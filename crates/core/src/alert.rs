//! Alert types for threshold violation notifications.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{EntityId, Timestamp};

/// One rank in the configured severity scale.
///
/// Levels are configuration, not code: `rank` is the position of the level
/// in the configured list (0 = baseline), and ordering follows `rank`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeverityLevel {
    pub rank: u8,
    pub name: String,
}

impl SeverityLevel {
    pub fn new(rank: u8, name: impl Into<String>) -> Self {
        Self {
            rank,
            name: name.into(),
        }
    }

    /// Whether this is the least severe level of its scale.
    pub fn is_baseline(&self) -> bool {
        self.rank == 0
    }
}

impl Ord for SeverityLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for SeverityLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A single threshold crossing for one entity and metric.
///
/// Created by the alerting pipeline, written once to the store, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// The GPU that triggered the alert.
    pub entity_id: EntityId,
    /// Canonical metric name (see [`crate::metric_names`]).
    pub metric_name: String,
    /// The observed (or derived) value that triggered the alert.
    pub value: f64,
    /// Lower bound of the level that was reached.
    pub threshold_crossed: f64,
    /// The level the value was classified at.
    pub severity: SeverityLevel,
    /// When the reading was sampled.
    pub timestamp: Timestamp,
}
