//! Rows for the `gpu_readings` and `alert_history` tables.
//!
//! Stored payloads are decoded through serde into fixed shapes. A row that
//! does not match is reported as a [`RowError`] and never evaluated.

use std::collections::BTreeMap;

use sentinel_core::alert::{AlertEvent, SeverityLevel};
use sentinel_core::metrics::EntityReading;
use sentinel_core::types::{DbId, EntityId, Timestamp};
use sqlx::FromRow;

/// Why a stored row could not be turned into a domain value.
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    #[error("row {id}: readings payload is not a map of numbers: {source}")]
    Payload {
        id: DbId,
        #[source]
        source: serde_json::Error,
    },

    #[error("row {id}: metric '{metric}' is not finite")]
    NonFinite { id: DbId, metric: String },

    #[error("row {id}: severity rank {rank} is out of range")]
    SeverityRank { id: DbId, rank: i16 },
}

// ---------------------------------------------------------------------------
// GPU readings (append-only)
// ---------------------------------------------------------------------------

/// One entity's readings for one sampling cycle.
#[derive(Debug, Clone, FromRow)]
pub struct GpuReadingRow {
    pub id: DbId,
    pub entity_id: EntityId,
    pub readings: serde_json::Value,
    pub recorded_at: Timestamp,
    pub created_at: Timestamp,
}

impl GpuReadingRow {
    pub fn into_reading(self) -> Result<EntityReading, RowError> {
        let values: BTreeMap<String, f64> = serde_json::from_value(self.readings)
            .map_err(|source| RowError::Payload { id: self.id, source })?;

        if let Some((metric, _)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(RowError::NonFinite {
                id: self.id,
                metric: metric.clone(),
            });
        }

        Ok(EntityReading {
            entity_id: self.entity_id,
            values,
            timestamp: self.recorded_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Alert history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow)]
pub struct AlertRow {
    pub id: DbId,
    pub entity_id: EntityId,
    pub metric_name: String,
    pub metric_value: f64,
    pub threshold_value: f64,
    pub severity: String,
    pub severity_rank: i16,
    pub created_at: Timestamp,
}

impl AlertRow {
    pub fn into_alert(self) -> Result<AlertEvent, RowError> {
        let rank = u8::try_from(self.severity_rank).map_err(|_| RowError::SeverityRank {
            id: self.id,
            rank: self.severity_rank,
        })?;
        for (metric, value) in [
            (&self.metric_name, self.metric_value),
            (&self.metric_name, self.threshold_value),
        ] {
            if !value.is_finite() {
                return Err(RowError::NonFinite {
                    id: self.id,
                    metric: metric.clone(),
                });
            }
        }

        Ok(AlertEvent {
            entity_id: self.entity_id,
            metric_name: self.metric_name,
            value: self.metric_value,
            threshold_crossed: self.threshold_value,
            severity: SeverityLevel::new(rank, self.severity),
            timestamp: self.created_at,
        })
    }
}
