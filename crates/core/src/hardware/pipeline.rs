//! Per-cycle alerting: derive ratios, classify, deduplicate, persist.

use std::sync::Arc;

use crate::alert::{AlertEvent, SeverityLevel};
use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::hardware::cooldown::AlertDeduplicator;
use crate::hardware::ratio::{Ratio, RatioComputer};
use crate::hardware::thresholds::{resolve_min_alert_level, ThresholdEvaluator};
use crate::metrics::EntityReading;
use crate::store::MetricStore;

/// Turns a batch of readings into alert events.
///
/// Owns the deduplicator, so one pipeline instance must be shared by every
/// caller that should observe the same cooldown state.
pub struct AlertingPipeline {
    evaluator: ThresholdEvaluator,
    ratios: RatioComputer,
    dedup: AlertDeduplicator,
    min_alert_level: SeverityLevel,
    alert_metrics: Vec<String>,
    store: Arc<dyn MetricStore>,
}

impl AlertingPipeline {
    pub fn new(config: &MonitorConfig, store: Arc<dyn MetricStore>) -> Result<Self, CoreError> {
        let evaluator = ThresholdEvaluator::from_config(config)?;
        let min_alert_level = resolve_min_alert_level(evaluator.scale(), &config.min_alert_level)?;
        Ok(Self {
            evaluator,
            ratios: RatioComputer::new(config.derived_metrics.clone()),
            dedup: AlertDeduplicator::new(config.cooldown()?, config.dedup_scope),
            min_alert_level,
            alert_metrics: config.alert_metrics.clone(),
            store,
        })
    }

    pub fn evaluator(&self) -> &ThresholdEvaluator {
        &self.evaluator
    }

    pub fn deduplicator(&self) -> &AlertDeduplicator {
        &self.dedup
    }

    pub fn min_alert_level(&self) -> &SeverityLevel {
        &self.min_alert_level
    }

    /// Evaluate a batch and persist the resulting alerts in one append.
    ///
    /// A store failure is logged and swallowed: the alerts are still
    /// returned and their cooldown stays consumed.
    pub async fn process(&self, readings: &[EntityReading]) -> Vec<AlertEvent> {
        let alerts = self.evaluate_batch(readings);
        if alerts.is_empty() {
            return alerts;
        }

        match self.store.append_alerts(&alerts).await {
            Ok(()) => {
                tracing::info!(count = alerts.len(), "Generated alerts");
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    count = alerts.len(),
                    "Failed to persist alerts; cooldown remains consumed"
                );
            }
        }
        alerts
    }

    /// Evaluate a batch without persisting anything.
    ///
    /// Every triggered evaluation updates the deduplicator.
    pub fn evaluate_batch(&self, readings: &[EntityReading]) -> Vec<AlertEvent> {
        let mut alerts = Vec::new();
        for reading in readings {
            for metric in &self.alert_metrics {
                if let Some(alert) = self.check_metric(reading, metric) {
                    alerts.push(alert);
                }
            }
        }
        alerts
    }

    /// Classify one metric of one reading and push it through the deduplicator.
    fn check_metric(&self, reading: &EntityReading, metric: &str) -> Option<AlertEvent> {
        let value = self.metric_value(reading, metric)?;
        if !value.is_finite() {
            tracing::warn!(
                entity_id = reading.entity_id,
                metric,
                value,
                "Skipping non-finite metric value"
            );
            return None;
        }

        let classification = match self.evaluator.evaluate(metric, value) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(entity_id = reading.entity_id, metric, error = %e, "Skipping metric");
                return None;
            }
        };

        if classification.level < self.min_alert_level {
            return None; // within normal range
        }
        // Anything at or above the alertable minimum matched a bound.
        let threshold_crossed = classification.threshold?;

        let key = self
            .dedup
            .key_for(reading.entity_id, metric, &classification.level);
        if !self.dedup.should_trigger(&key, reading.timestamp) {
            tracing::debug!(
                entity_id = reading.entity_id,
                metric,
                severity = %classification.level,
                "Alert suppressed by cooldown"
            );
            return None;
        }

        Some(AlertEvent {
            entity_id: reading.entity_id,
            metric_name: metric.to_string(),
            value,
            threshold_crossed,
            severity: classification.level,
            timestamp: reading.timestamp,
        })
    }

    /// Resolve the value to evaluate: a derived ratio when one is defined
    /// for `metric`, otherwise the raw reading.
    fn metric_value(&self, reading: &EntityReading, metric: &str) -> Option<f64> {
        let Some(definition) = self.ratios.definition(metric) else {
            return reading.get(metric);
        };

        match self.ratios.compute(definition, reading)? {
            Ratio::Computed(v) => Some(v),
            Ratio::Degenerate => {
                tracing::warn!(
                    entity_id = reading.entity_id,
                    metric,
                    denominator = %definition.denominator,
                    "Zero denominator in derived metric; not alerting"
                );
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
