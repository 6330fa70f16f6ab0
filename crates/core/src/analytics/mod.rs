//! Historical analytics over a stored time range.
//!
//! Every entry point is a pure function of the samples it is handed: the
//! caller reads the range from the store once and passes the flat, oldest
//! first sample list in. Samples sharing an entity and timestamp are joined
//! into one [`SampleRow`] so ratio metrics can pair their operands.

pub mod anomaly;
pub mod efficiency;
pub mod stats;
pub mod trend;
pub mod usage;

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::config::MonitorConfig;
use crate::metrics::MetricSample;
use crate::types::{EntityId, Timestamp};

pub use anomaly::AnomalyRecord;
pub use efficiency::{EfficiencyMetrics, RatioSummary};
pub use trend::{TrendDirection, TrendResult};
pub use usage::{DistributionBin, PeakPoint};

/// Mean value per group, keyed by metric then by group (hour 0-23 or
/// weekday 0-6, Monday = 0). Groups without samples are absent.
pub type GroupedAverages = BTreeMap<String, BTreeMap<u32, f64>>;

/// Usage patterns over a range. Derived on every call, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoricalStatistics {
    pub hourly_avg: GroupedAverages,
    pub daily_avg: GroupedAverages,
    pub peak_usage_times: Vec<PeakPoint>,
    /// Empty when the range holds no utilization samples.
    pub utilization_distribution: Vec<DistributionBin>,
}

/// All values one entity reported at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub entity_id: EntityId,
    pub timestamp: Timestamp,
    pub values: BTreeMap<String, f64>,
}

impl SampleRow {
    pub fn get(&self, metric: &str) -> Option<f64> {
        self.values.get(metric).copied()
    }
}

/// Join flat samples into rows keyed by `(entity, timestamp)`, keeping the
/// order in which each row first appears.
pub fn join_rows(samples: &[MetricSample]) -> Vec<SampleRow> {
    let mut index: HashMap<(EntityId, Timestamp), usize> = HashMap::new();
    let mut rows: Vec<SampleRow> = Vec::new();

    for sample in samples {
        let slot = *index
            .entry((sample.entity_id, sample.timestamp))
            .or_insert_with(|| {
                rows.push(SampleRow {
                    entity_id: sample.entity_id,
                    timestamp: sample.timestamp,
                    values: BTreeMap::new(),
                });
                rows.len() - 1
            });
        rows[slot]
            .values
            .insert(sample.metric_name.clone(), sample.value);
    }
    rows
}

/// Computes aggregates, peaks, distributions, anomalies, trends, and
/// efficiency figures.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    tracked_metrics: Vec<String>,
    anomaly_k: f64,
}

impl AnalyticsEngine {
    pub fn new(tracked_metrics: Vec<String>, anomaly_k: f64) -> Self {
        Self {
            tracked_metrics,
            anomaly_k,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.tracked_metrics.clone(), config.anomaly_k)
    }

    pub fn tracked_metrics(&self) -> &[String] {
        &self.tracked_metrics
    }

    pub fn anomaly_k(&self) -> f64 {
        self.anomaly_k
    }

    /// Hourly and daily averages, peaks, and the utilization distribution.
    pub fn usage_patterns(&self, samples: &[MetricSample]) -> HistoricalStatistics {
        if samples.is_empty() {
            return HistoricalStatistics::default();
        }
        let rows = join_rows(samples);
        HistoricalStatistics {
            hourly_avg: usage::hourly_averages(&rows, &self.tracked_metrics),
            daily_avg: usage::daily_averages(&rows, &self.tracked_metrics),
            peak_usage_times: usage::peak_points(&rows, &self.tracked_metrics),
            utilization_distribution: usage::utilization_distribution(&rows),
        }
    }

    /// Samples deviating from their metric's mean by more than `k` standard deviations.
    pub fn detect_anomalies(&self, samples: &[MetricSample]) -> Vec<AnomalyRecord> {
        let rows = join_rows(samples);
        self.tracked_metrics
            .iter()
            .flat_map(|metric| anomaly::detect(&rows, metric, self.anomaly_k))
            .collect()
    }

    /// Linear trend per tracked metric; metrics with too few points are omitted.
    pub fn analyze_trends(&self, samples: &[MetricSample]) -> BTreeMap<String, TrendResult> {
        let rows = join_rows(samples);
        self.tracked_metrics
            .iter()
            .filter_map(|metric| {
                let series: Vec<f64> = rows.iter().filter_map(|r| r.get(metric)).collect();
                trend::linear_trend(&series).map(|t| (metric.clone(), t))
            })
            .collect()
    }

    /// Power and memory efficiency ratios.
    pub fn efficiency_metrics(&self, samples: &[MetricSample]) -> EfficiencyMetrics {
        efficiency::compute(&join_rows(samples))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use chrono::Duration;

    #[test]
    fn join_rows_groups_by_entity_and_timestamp() {
        let t = epoch();
        let samples = vec![
            sample(0, "utilization", 50.0, t),
            sample(0, "power_draw", 200.0, t),
            sample(1, "utilization", 70.0, t),
            sample(0, "utilization", 55.0, t + Duration::seconds(5)),
        ];
        let rows = join_rows(&samples);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("power_draw"), Some(200.0));
        assert_eq!(rows[1].entity_id, 1);
        assert_eq!(rows[2].get("utilization"), Some(55.0));
    }

    #[test]
    fn empty_range_yields_empty_results() {
        let engine = AnalyticsEngine::from_config(&MonitorConfig::default());
        assert_eq!(engine.usage_patterns(&[]), HistoricalStatistics::default());
        assert!(engine.detect_anomalies(&[]).is_empty());
        assert!(engine.analyze_trends(&[]).is_empty());
        assert_eq!(engine.efficiency_metrics(&[]), EfficiencyMetrics::default());
    }

    #[test]
    fn trends_reported_per_tracked_metric() {
        let engine = AnalyticsEngine::from_config(&MonitorConfig::default());
        let values: Vec<f64> = (1..=50).map(f64::from).collect();
        let trends = engine.analyze_trends(&series("utilization", &values));
        assert_eq!(trends.len(), 1);
        let t = &trends["utilization"];
        assert!(t.slope > 0.0);
        assert_eq!(t.direction, TrendDirection::Increasing);
        assert!(t.significant);
    }

    #[test]
    fn untracked_metrics_are_ignored() {
        let engine = AnalyticsEngine::new(vec!["temperature".to_string()], 2.0);
        let stats = engine.usage_patterns(&series("fan_speed", &[10.0, 20.0]));
        assert!(stats.hourly_avg.is_empty());
        assert!(stats.peak_usage_times.is_empty());
    }
}
