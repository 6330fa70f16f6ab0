//! Entry point used by transports: ingestion plus the historical query surface.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Duration;

use crate::alert::AlertEvent;
use crate::analytics::{
    AnalyticsEngine, AnomalyRecord, EfficiencyMetrics, HistoricalStatistics, TrendResult,
};
use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::hardware::pipeline::AlertingPipeline;
use crate::metrics::{group_samples, EntityReading, MetricSample, TimeRange};
use crate::store::{MetricStore, PurgeCounts, RetentionCutoffs};
use crate::types::{EntityId, Timestamp};

/// Owns the alerting pipeline (and so the cooldown state) and the analytics
/// engine. Construct one per process and share it behind an `Arc`.
pub struct MonitorService {
    config: MonitorConfig,
    pipeline: AlertingPipeline,
    analytics: Arc<AnalyticsEngine>,
    store: Arc<dyn MetricStore>,
    sample_logging: AtomicBool,
    /// Newest reading seen per entity since startup.
    latest: RwLock<BTreeMap<EntityId, EntityReading>>,
}

impl MonitorService {
    pub fn new(config: MonitorConfig, store: Arc<dyn MetricStore>) -> Result<Self, CoreError> {
        config.validate()?;
        let pipeline = AlertingPipeline::new(&config, Arc::clone(&store))?;
        let analytics = Arc::new(AnalyticsEngine::from_config(&config));
        Ok(Self {
            config,
            pipeline,
            analytics,
            store,
            sample_logging: AtomicBool::new(true),
            latest: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &AlertingPipeline {
        &self.pipeline
    }

    pub fn store(&self) -> &Arc<dyn MetricStore> {
        &self.store
    }

    /// Record raw readings (when sample logging is on) and run alerting.
    pub async fn ingest(&self, readings: &[EntityReading]) -> Vec<AlertEvent> {
        if readings.is_empty() {
            return Vec::new();
        }

        self.remember_latest(readings);

        if self.sample_logging_enabled() {
            if let Err(e) = self.store.append_readings(readings).await {
                tracing::error!(error = %e, count = readings.len(), "Failed to store readings");
            }
        }

        self.pipeline.process(readings).await
    }

    fn remember_latest(&self, readings: &[EntityReading]) {
        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        for reading in readings {
            match latest.get(&reading.entity_id) {
                Some(seen) if seen.timestamp > reading.timestamp => {}
                _ => {
                    latest.insert(reading.entity_id, reading.clone());
                }
            }
        }
    }

    /// The newest reading of every entity ingested since startup, by entity id.
    ///
    /// Kept in memory regardless of sample logging.
    pub fn latest_readings(&self) -> Vec<EntityReading> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Stored readings inside `range`, oldest first.
    pub async fn get_history(&self, range: TimeRange) -> Result<Vec<EntityReading>, CoreError> {
        let samples = self.store.query_samples(range).await?;
        Ok(group_samples(samples))
    }

    /// Alerts from the last `hours`, newest first.
    pub async fn get_recent_alerts(&self, hours: i64) -> Result<Vec<AlertEvent>, CoreError> {
        let range = TimeRange::last_hours(positive(hours, "hours")?)?;
        Ok(self.store.query_alerts(range).await?)
    }

    pub async fn get_usage_patterns(&self, days: i64) -> Result<HistoricalStatistics, CoreError> {
        let range = TimeRange::last_days(positive(days, "days")?)?;
        self.usage_patterns_between(range).await
    }

    pub async fn usage_patterns_between(
        &self,
        range: TimeRange,
    ) -> Result<HistoricalStatistics, CoreError> {
        self.analyze(range, |engine, samples| engine.usage_patterns(samples))
            .await
    }

    pub async fn detect_anomalies(&self, hours: i64) -> Result<Vec<AnomalyRecord>, CoreError> {
        let range = TimeRange::last_hours(positive(hours, "hours")?)?;
        self.analyze(range, |engine, samples| engine.detect_anomalies(samples))
            .await
    }

    pub async fn analyze_trends(
        &self,
        days: i64,
    ) -> Result<BTreeMap<String, TrendResult>, CoreError> {
        let range = TimeRange::last_days(positive(days, "days")?)?;
        self.analyze(range, |engine, samples| engine.analyze_trends(samples))
            .await
    }

    pub async fn efficiency_metrics(&self, days: i64) -> Result<EfficiencyMetrics, CoreError> {
        let range = TimeRange::last_days(positive(days, "days")?)?;
        self.analyze(range, |engine, samples| engine.efficiency_metrics(samples))
            .await
    }

    /// Read the range once, then compute on a blocking thread.
    async fn analyze<T, F>(&self, range: TimeRange, compute: F) -> Result<T, CoreError>
    where
        T: Send + 'static,
        F: FnOnce(&AnalyticsEngine, &[MetricSample]) -> T + Send + 'static,
    {
        let samples = self.store.query_samples(range).await?;
        tracing::debug!(
            samples = samples.len(),
            start = %range.start,
            end = %range.end,
            "Running analytics"
        );

        let engine = Arc::clone(&self.analytics);
        tokio::task::spawn_blocking(move || compute(&engine, &samples))
            .await
            .map_err(|e| CoreError::Internal(format!("analytics task failed: {e}")))
    }

    pub fn sample_logging_enabled(&self) -> bool {
        self.sample_logging.load(Ordering::SeqCst)
    }

    pub fn set_sample_logging(&self, enabled: bool) {
        self.sample_logging.store(enabled, Ordering::SeqCst);
        tracing::info!(enabled, "Sample logging updated");
    }

    /// Flip sample logging and return the new state.
    pub fn toggle_sample_logging(&self) -> bool {
        let enabled = !self.sample_logging.fetch_xor(true, Ordering::SeqCst);
        tracing::info!(enabled, "Sample logging toggled");
        enabled
    }

    /// Delete readings and alerts older than their retention windows.
    pub async fn purge_expired(&self, now: Timestamp) -> Result<PurgeCounts, CoreError> {
        let cutoffs = RetentionCutoffs {
            readings: retention_cutoff(now, self.config.reading_retention_days)?,
            alerts: retention_cutoff(now, self.config.alert_retention_days)?,
        };
        Ok(self.store.purge_before(cutoffs).await?)
    }

    pub fn reset_cooldowns(&self) {
        self.pipeline.deduplicator().reset();
    }
}

fn retention_cutoff(now: Timestamp, days: i64) -> Result<Timestamp, CoreError> {
    Duration::try_days(days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| CoreError::Configuration(format!("retention of {days} days is out of range")))
}

fn positive(value: i64, name: &str) -> Result<i64, CoreError> {
    if value <= 0 {
        return Err(CoreError::Validation(format!("{name} must be positive")));
    }
    Ok(value)
}
