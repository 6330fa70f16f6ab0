//! Monitoring configuration: severity scale, thresholds, derived metrics,
//! cooldown, and analytics tuning.
//!
//! Two-level (warning/critical) and five-level (ideal .. critical)
//! deployments are both just instances of [`MonitorConfig`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::hardware::thresholds::{resolve_min_alert_level, ThresholdEvaluator};
use crate::metric_names::{
    METRIC_FAN_SPEED, METRIC_MEMORY_TOTAL, METRIC_MEMORY_USAGE, METRIC_MEMORY_USED,
    METRIC_POWER_DRAW, METRIC_POWER_LIMIT, METRIC_TEMPERATURE, METRIC_UTILIZATION,
};

/// Default cooldown between repeated alerts for the same key: 5 minutes.
pub const DEFAULT_COOLDOWN_SECS: u64 = 300;

/// Default anomaly sensitivity, in standard deviations.
pub const DEFAULT_ANOMALY_K: f64 = 2.0;

/// Default retention for stored readings.
pub const DEFAULT_READING_RETENTION_DAYS: i64 = 30;

/// Default retention for alert history.
pub const DEFAULT_ALERT_RETENTION_DAYS: i64 = 90;

/// Longest accepted cooldown: one week.
pub const MAX_COOLDOWN_SECS: u64 = 7 * 24 * 3600;

/// Longest accepted retention window: ten years.
pub const MAX_RETENTION_DAYS: i64 = 3650;

/// A `(level, lower_bound)` pair in a metric's threshold list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelBound {
    pub level: String,
    pub lower_bound: f64,
}

impl LevelBound {
    pub fn new(level: impl Into<String>, lower_bound: f64) -> Self {
        Self {
            level: level.into(),
            lower_bound,
        }
    }
}

/// A metric computed as `numerator / denominator * 100` from two raw fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetric {
    pub name: String,
    pub numerator: String,
    pub denominator: String,
}

impl DerivedMetric {
    pub fn new(
        name: impl Into<String>,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            numerator: numerator.into(),
            denominator: denominator.into(),
        }
    }
}

/// Identity under which cooldown state is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupScope {
    /// `(entity, metric, severity)`: escalating to a new level fires immediately.
    #[default]
    PerSeverity,
    /// `(entity, metric)`: one alert per metric per cooldown, whatever the level.
    PerMetric,
}

/// Full monitoring configuration.
///
/// Every field has a default so partial configuration files only need to
/// mention what they override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Level names ordered from least to most severe. The first is the baseline.
    pub severity_levels: Vec<String>,
    /// Lowest level that produces an alert.
    pub min_alert_level: String,
    /// Per-metric ordered `(level, lower_bound)` lists.
    pub thresholds: BTreeMap<String, Vec<LevelBound>>,
    /// Ratio metrics computed before evaluation.
    pub derived_metrics: Vec<DerivedMetric>,
    /// Metrics evaluated for every reading.
    pub alert_metrics: Vec<String>,
    /// Minimum seconds between two triggers for the same dedup key.
    pub cooldown_secs: u64,
    pub dedup_scope: DedupScope,
    /// Anomaly threshold, in population standard deviations.
    pub anomaly_k: f64,
    /// Metrics covered by aggregation, peaks, anomalies, and trends.
    pub tracked_metrics: Vec<String>,
    /// Stored readings older than this many days are purged.
    pub reading_retention_days: i64,
    /// Alerts older than this many days are purged.
    pub alert_retention_days: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let two_level = |warning: f64, critical: f64| {
            vec![
                LevelBound::new("warning", warning),
                LevelBound::new("critical", critical),
            ]
        };

        let mut thresholds = BTreeMap::new();
        thresholds.insert(METRIC_TEMPERATURE.to_string(), two_level(80.0, 90.0));
        thresholds.insert(METRIC_UTILIZATION.to_string(), two_level(90.0, 95.0));
        thresholds.insert(METRIC_MEMORY_USAGE.to_string(), two_level(90.0, 95.0));
        thresholds.insert(METRIC_POWER_DRAW.to_string(), two_level(90.0, 95.0));
        thresholds.insert(METRIC_FAN_SPEED.to_string(), two_level(80.0, 95.0));

        Self {
            severity_levels: vec![
                "normal".to_string(),
                "warning".to_string(),
                "critical".to_string(),
            ],
            min_alert_level: "warning".to_string(),
            thresholds,
            derived_metrics: vec![
                DerivedMetric::new(METRIC_MEMORY_USAGE, METRIC_MEMORY_USED, METRIC_MEMORY_TOTAL),
                DerivedMetric::new(METRIC_POWER_DRAW, METRIC_POWER_DRAW, METRIC_POWER_LIMIT),
            ],
            alert_metrics: [
                METRIC_TEMPERATURE,
                METRIC_UTILIZATION,
                METRIC_MEMORY_USAGE,
                METRIC_POWER_DRAW,
                METRIC_FAN_SPEED,
            ]
            .iter()
            .map(|m| m.to_string())
            .collect(),
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            dedup_scope: DedupScope::default(),
            anomaly_k: DEFAULT_ANOMALY_K,
            tracked_metrics: [
                METRIC_UTILIZATION,
                METRIC_TEMPERATURE,
                METRIC_MEMORY_USED,
                METRIC_POWER_DRAW,
            ]
            .iter()
            .map(|m| m.to_string())
            .collect(),
            reading_retention_days: DEFAULT_READING_RETENTION_DAYS,
            alert_retention_days: DEFAULT_ALERT_RETENTION_DAYS,
        }
    }
}

impl MonitorConfig {
    /// Cooldown as a signed duration for timestamp arithmetic.
    pub fn cooldown(&self) -> Result<chrono::Duration, CoreError> {
        i64::try_from(self.cooldown_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                CoreError::Configuration(format!(
                    "cooldown_secs {} is out of range",
                    self.cooldown_secs
                ))
            })
    }

    /// Check every invariant the engine relies on.
    ///
    /// Threshold lists must name known levels with strictly increasing
    /// bounds and strictly increasing severity; the alertable minimum must
    /// sit above the baseline.
    pub fn validate(&self) -> Result<(), CoreError> {
        let evaluator = ThresholdEvaluator::from_config(self)?;
        resolve_min_alert_level(evaluator.scale(), &self.min_alert_level)?;

        if !(self.anomaly_k.is_finite() && self.anomaly_k > 0.0) {
            return Err(CoreError::Configuration(format!(
                "anomaly_k must be a positive number, got {}",
                self.anomaly_k
            )));
        }
        if self.cooldown_secs > MAX_COOLDOWN_SECS {
            return Err(CoreError::Configuration(format!(
                "cooldown_secs must be at most {MAX_COOLDOWN_SECS}, got {}",
                self.cooldown_secs
            )));
        }
        for (name, days) in [
            ("reading_retention_days", self.reading_retention_days),
            ("alert_retention_days", self.alert_retention_days),
        ] {
            if !(1..=MAX_RETENTION_DAYS).contains(&days) {
                return Err(CoreError::Configuration(format!(
                    "{name} must be between 1 and {MAX_RETENTION_DAYS}, got {days}"
                )));
            }
        }
        for derived in &self.derived_metrics {
            if derived.name.is_empty() || derived.numerator.is_empty() || derived.denominator.is_empty()
            {
                return Err(CoreError::Configuration(
                    "derived metrics need a name, numerator, and denominator".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The five-level scale (ideal, good, caution, warning, critical) with
    /// the same alertable minimum as the default.
    pub fn five_level() -> Self {
        let five = |good: f64, caution: f64, warning: f64, critical: f64| {
            vec![
                LevelBound::new("good", good),
                LevelBound::new("caution", caution),
                LevelBound::new("warning", warning),
                LevelBound::new("critical", critical),
            ]
        };

        let mut thresholds = BTreeMap::new();
        thresholds.insert(METRIC_TEMPERATURE.to_string(), five(40.0, 60.0, 80.0, 90.0));
        thresholds.insert(METRIC_UTILIZATION.to_string(), five(30.0, 60.0, 90.0, 95.0));
        thresholds.insert(METRIC_MEMORY_USAGE.to_string(), five(30.0, 60.0, 90.0, 95.0));
        thresholds.insert(METRIC_POWER_DRAW.to_string(), five(30.0, 60.0, 90.0, 95.0));
        thresholds.insert(METRIC_FAN_SPEED.to_string(), five(30.0, 50.0, 80.0, 95.0));

        Self {
            severity_levels: ["ideal", "good", "caution", "warning", "critical"]
                .iter()
                .map(|l| l.to_string())
                .collect(),
            thresholds,
            ..Self::default()
        }
    }
}
