//! PostgreSQL implementation of [`MetricStore`].

use async_trait::async_trait;
use sentinel_core::alert::AlertEvent;
use sentinel_core::metrics::{EntityReading, MetricSample, TimeRange};
use sentinel_core::store::{MetricStore, PurgeCounts, RetentionCutoffs, StoreError};

use crate::repositories::{AlertRepo, GpuReadingRepo};
use crate::DbPool;

#[derive(Clone)]
pub struct PgMetricStore {
    pool: DbPool,
}

impl PgMetricStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Connection-level failures are reported as unavailability; everything
/// else is a query failure.
fn store_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

#[async_trait]
impl MetricStore for PgMetricStore {
    async fn append_alerts(&self, alerts: &[AlertEvent]) -> Result<(), StoreError> {
        AlertRepo::insert_batch(&self.pool, alerts)
            .await
            .map_err(store_error)
    }

    async fn append_readings(&self, readings: &[EntityReading]) -> Result<(), StoreError> {
        GpuReadingRepo::insert_batch(&self.pool, readings)
            .await
            .map_err(store_error)
    }

    async fn query_alerts(&self, range: TimeRange) -> Result<Vec<AlertEvent>, StoreError> {
        let rows = AlertRepo::list_between(&self.pool, range.start, range.end)
            .await
            .map_err(store_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match row.into_alert() {
                Ok(alert) => Some(alert),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping invalid alert row");
                    None
                }
            })
            .collect())
    }

    async fn query_samples(&self, range: TimeRange) -> Result<Vec<MetricSample>, StoreError> {
        let rows = GpuReadingRepo::list_between(&self.pool, range.start, range.end)
            .await
            .map_err(store_error)?;

        // Rows arrive ordered by (recorded_at, entity_id) and each reading's
        // values are name-ordered, so the flattened list is already sorted.
        let mut samples = Vec::with_capacity(rows.len() * 4);
        for row in rows {
            match row.into_reading() {
                Ok(reading) => samples.extend(reading.to_samples()),
                Err(e) => tracing::warn!(error = %e, "Skipping invalid reading row"),
            }
        }
        Ok(samples)
    }

    async fn purge_before(&self, cutoffs: RetentionCutoffs) -> Result<PurgeCounts, StoreError> {
        let readings = GpuReadingRepo::delete_older_than(&self.pool, cutoffs.readings)
            .await
            .map_err(store_error)?;
        let alerts = AlertRepo::delete_older_than(&self.pool, cutoffs.alerts)
            .await
            .map_err(store_error)?;
        Ok(PurgeCounts { readings, alerts })
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await.map_err(store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn pool_failures_map_to_unavailable() {
        assert_matches!(
            store_error(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        );
        assert_matches!(
            store_error(sqlx::Error::RowNotFound),
            StoreError::Query(_)
        );
    }
}
