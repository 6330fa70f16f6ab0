//! Alert deduplication with a per-key cooldown window.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Duration;

use crate::alert::SeverityLevel;
use crate::config::DedupScope;
use crate::types::{EntityId, Timestamp};

/// Identity under which cooldown state is tracked.
///
/// `severity` is `None` under [`DedupScope::PerMetric`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub entity_id: EntityId,
    pub metric_name: String,
    pub severity: Option<SeverityLevel>,
}

/// Tracks when each key last fired so repeats inside the cooldown window
/// are suppressed.
///
/// Safe to share between threads: the read-modify-write of a key's
/// timestamp happens under one lock, so concurrent triggers for the same
/// key yield exactly one `true` per window.
#[derive(Debug)]
pub struct AlertDeduplicator {
    cooldown: Duration,
    scope: DedupScope,
    last_trigger: Mutex<HashMap<DedupKey, Timestamp>>,
}

impl AlertDeduplicator {
    pub fn new(cooldown: Duration, scope: DedupScope) -> Self {
        Self {
            cooldown,
            scope,
            last_trigger: Mutex::new(HashMap::new()),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Build the key for an evaluation under the configured scope.
    pub fn key_for(
        &self,
        entity_id: EntityId,
        metric_name: &str,
        severity: &SeverityLevel,
    ) -> DedupKey {
        DedupKey {
            entity_id,
            metric_name: metric_name.to_string(),
            severity: match self.scope {
                DedupScope::PerSeverity => Some(severity.clone()),
                DedupScope::PerMetric => None,
            },
        }
    }

    /// Check if an alert is allowed (not within cooldown) and record it if so.
    ///
    /// Returns `true` if the alert should be emitted. A suppressed call
    /// leaves the recorded timestamp unchanged.
    pub fn should_trigger(&self, key: &DedupKey, now: Timestamp) -> bool {
        let mut last_trigger = self.lock();
        if let Some(last) = last_trigger.get(key) {
            if now.signed_duration_since(*last) < self.cooldown {
                return false;
            }
        }
        last_trigger.insert(key.clone(), now);
        true
    }

    /// Forget every recorded trigger.
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Number of keys with a recorded trigger.
    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DedupKey, Timestamp>> {
        // The map is always left consistent, so a poisoned lock is still usable.
        self.last_trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
