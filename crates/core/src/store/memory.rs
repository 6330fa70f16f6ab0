//! In-process [`MetricStore`] backed by vectors.
//!
//! Useful for tests and for running the engine without a database. Appends
//! can be switched to fail so persistence-failure paths can be exercised.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MetricStore, PurgeCounts, RetentionCutoffs, StoreError};
use crate::alert::AlertEvent;
use crate::metrics::{EntityReading, MetricSample, TimeRange};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    readings: RwLock<Vec<EntityReading>>,
    alerts: RwLock<Vec<AlertEvent>>,
    fail_appends: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent append fail with [`StoreError::Unavailable`].
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Every stored alert, in insertion order.
    pub async fn alerts(&self) -> Vec<AlertEvent> {
        self.alerts.read().await.clone()
    }

    /// Every stored reading, in insertion order.
    pub async fn readings(&self) -> Vec<EntityReading> {
        self.readings.read().await.clone()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store is rejecting writes".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl MetricStore for InMemoryStore {
    async fn append_alerts(&self, alerts: &[AlertEvent]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.alerts.write().await.extend_from_slice(alerts);
        Ok(())
    }

    async fn append_readings(&self, readings: &[EntityReading]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.readings.write().await.extend_from_slice(readings);
        Ok(())
    }

    async fn query_alerts(&self, range: TimeRange) -> Result<Vec<AlertEvent>, StoreError> {
        let mut alerts: Vec<AlertEvent> = self
            .alerts
            .read()
            .await
            .iter()
            .filter(|a| range.contains(a.timestamp))
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(alerts)
    }

    async fn query_samples(&self, range: TimeRange) -> Result<Vec<MetricSample>, StoreError> {
        let mut samples: Vec<MetricSample> = self
            .readings
            .read()
            .await
            .iter()
            .filter(|r| range.contains(r.timestamp))
            .flat_map(EntityReading::to_samples)
            .collect();
        samples.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a.entity_id.cmp(&b.entity_id))
                .then_with(|| a.metric_name.cmp(&b.metric_name))
        });
        Ok(samples)
    }

    async fn purge_before(&self, cutoffs: RetentionCutoffs) -> Result<PurgeCounts, StoreError> {
        let mut readings = self.readings.write().await;
        let before = readings.len();
        readings.retain(|r| r.timestamp >= cutoffs.readings);
        let readings_removed = before - readings.len();

        let mut alerts = self.alerts.write().await;
        let before = alerts.len();
        alerts.retain(|a| a.timestamp >= cutoffs.alerts);
        let alerts_removed = before - alerts.len();

        Ok(PurgeCounts {
            readings: readings_removed as u64,
            alerts: alerts_removed as u64,
        })
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
