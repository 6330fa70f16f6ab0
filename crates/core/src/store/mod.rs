//! Persistence boundary.
//!
//! The alerting pipeline and the analytics engine only see [`MetricStore`].
//! The PostgreSQL implementation lives in `sentinel-db`; [`memory`] holds an
//! in-process implementation.

pub mod memory;

use async_trait::async_trait;
use serde::Serialize;

use crate::alert::AlertEvent;
use crate::metrics::{EntityReading, MetricSample, TimeRange};
use crate::types::Timestamp;

/// Failure reported by a [`MetricStore`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store query failed: {0}")]
    Query(String),
}

/// Rows removed by a retention pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeCounts {
    pub readings: u64,
    pub alerts: u64,
}

/// Per-table retention cutoffs: rows recorded strictly before these are purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionCutoffs {
    pub readings: Timestamp,
    pub alerts: Timestamp,
}

/// Durable storage for readings and alert events.
///
/// Calls are blocking from the caller's point of view and are not retried
/// here; retry policy belongs to the implementation.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Append every alert of one pipeline pass in a single operation.
    async fn append_alerts(&self, alerts: &[AlertEvent]) -> Result<(), StoreError>;

    /// Append raw readings, one row per entity per cycle.
    async fn append_readings(&self, readings: &[EntityReading]) -> Result<(), StoreError>;

    /// Alerts inside `range`, newest first.
    async fn query_alerts(&self, range: TimeRange) -> Result<Vec<AlertEvent>, StoreError>;

    /// Samples inside `range`, oldest first (ties by entity, then metric name).
    async fn query_samples(&self, range: TimeRange) -> Result<Vec<MetricSample>, StoreError>;

    /// Delete readings and alerts recorded before their respective cutoffs.
    async fn purge_before(&self, cutoffs: RetentionCutoffs) -> Result<PurgeCounts, StoreError>;

    /// Cheap liveness check.
    async fn health_check(&self) -> Result<(), StoreError>;
}
