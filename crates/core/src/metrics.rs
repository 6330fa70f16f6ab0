//! Sampled readings and the time ranges used to query them.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EntityId, Timestamp};

/// One metric value for one entity at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub entity_id: EntityId,
    pub metric_name: String,
    pub value: f64,
    pub timestamp: Timestamp,
}

/// Everything the sampler reported for one entity in one cycle.
///
/// `values` maps raw field names (see [`crate::metric_names`]) to their values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityReading {
    pub entity_id: EntityId,
    pub values: BTreeMap<String, f64>,
    pub timestamp: Timestamp,
}

impl EntityReading {
    pub fn new(entity_id: EntityId, timestamp: Timestamp) -> Self {
        Self {
            entity_id,
            values: BTreeMap::new(),
            timestamp,
        }
    }

    /// Builder-style insert of a raw value.
    pub fn with(mut self, metric: impl Into<String>, value: f64) -> Self {
        self.values.insert(metric.into(), value);
        self
    }

    pub fn get(&self, metric: &str) -> Option<f64> {
        self.values.get(metric).copied()
    }

    /// Flatten into one [`MetricSample`] per value, ordered by metric name.
    pub fn to_samples(&self) -> Vec<MetricSample> {
        self.values
            .iter()
            .map(|(name, value)| MetricSample {
                entity_id: self.entity_id,
                metric_name: name.clone(),
                value: *value,
                timestamp: self.timestamp,
            })
            .collect()
    }
}

/// Regroup flattened samples into one reading per entity per instant.
///
/// Consecutive samples sharing `(entity_id, timestamp)` are merged, so input
/// ordered the way [`MetricStore::query_samples`] returns it comes back as
/// whole readings in the same order.
///
/// [`MetricStore::query_samples`]: crate::store::MetricStore::query_samples
pub fn group_samples(samples: impl IntoIterator<Item = MetricSample>) -> Vec<EntityReading> {
    let mut readings: Vec<EntityReading> = Vec::new();
    for sample in samples {
        match readings.last_mut() {
            Some(last) if last.entity_id == sample.entity_id && last.timestamp == sample.timestamp => {
                last.values.insert(sample.metric_name, sample.value);
            }
            _ => readings.push(
                EntityReading::new(sample.entity_id, sample.timestamp)
                    .with(sample.metric_name, sample.value),
            ),
        }
    }
    readings
}

/// A closed `[start, end]` interval of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    /// Build a range, rejecting `start > end`.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::Validation(format!(
                "start ({start}) must not be after end ({end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// The range covering `window` up to `end`.
    ///
    /// Fails with [`CoreError::Validation`] when the start would fall outside
    /// the representable time span.
    pub fn trailing(window: Duration, end: Timestamp) -> Result<Self, CoreError> {
        let start = end.checked_sub_signed(window).ok_or_else(|| {
            CoreError::Validation(format!("window of {window} before {end} is out of range"))
        })?;
        Self::new(start, end)
    }

    /// The `hours` leading up to `end`.
    pub fn hours_before(hours: i64, end: Timestamp) -> Result<Self, CoreError> {
        let window = Duration::try_hours(hours)
            .ok_or_else(|| CoreError::Validation(format!("{hours} hours is out of range")))?;
        Self::trailing(window, end)
    }

    /// The `days` leading up to `end`.
    pub fn days_before(days: i64, end: Timestamp) -> Result<Self, CoreError> {
        let window = Duration::try_days(days)
            .ok_or_else(|| CoreError::Validation(format!("{days} days is out of range")))?;
        Self::trailing(window, end)
    }

    /// The range covering the last `hours` up to the current time.
    pub fn last_hours(hours: i64) -> Result<Self, CoreError> {
        Self::hours_before(hours, Utc::now())
    }

    /// The range covering the last `days` up to the current time.
    pub fn last_days(days: i64) -> Result<Self, CoreError> {
        Self::days_before(days, Utc::now())
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start <= ts && ts <= self.end
    }
}
