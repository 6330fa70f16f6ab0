//! Z-score anomaly detection.

use serde::Serialize;

use super::stats::{mean, population_std};
use super::SampleRow;
use crate::types::{EntityId, Timestamp};

/// A sample flagged as anomalous.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    pub entity_id: EntityId,
    pub metric: String,
    pub value: f64,
    pub timestamp: Timestamp,
    /// Distance from the mean in standard deviations (always positive).
    pub deviation: f64,
}

/// Flag samples of `metric` whose distance from the metric mean exceeds
/// `k` population standard deviations. A constant series yields nothing.
pub fn detect(rows: &[SampleRow], metric: &str, k: f64) -> Vec<AnomalyRecord> {
    let points: Vec<(&SampleRow, f64)> = rows
        .iter()
        .filter_map(|r| r.get(metric).filter(|v| v.is_finite()).map(|v| (r, v)))
        .collect();
    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();

    let (Some(mu), Some(sigma)) = (mean(&values), population_std(&values)) else {
        return Vec::new();
    };
    if sigma == 0.0 || !sigma.is_finite() {
        return Vec::new();
    }

    points
        .into_iter()
        .filter_map(|(row, value)| {
            let deviation = (value - mu).abs() / sigma;
            (deviation > k).then(|| AnomalyRecord {
                entity_id: row.entity_id,
                metric: metric.to_string(),
                value,
                timestamp: row.timestamp,
                deviation,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::join_rows;
    use super::super::test_support::*;
    use super::*;

    fn base_with_outliers() -> Vec<f64> {
        // 98 points alternating 9/11 plus two outliers: mean 10, sigma 1.4.
        let mut values: Vec<f64> = (0..98).map(|i| if i % 2 == 0 { 9.0 } else { 11.0 }).collect();
        values.insert(40, 17.0);
        values.push(3.0);
        values
    }

    #[test]
    fn flags_points_beyond_k_sigma() {
        let rows = join_rows(&series("temperature", &base_with_outliers()));
        let anomalies = detect(&rows, "temperature", 2.0);

        assert_eq!(anomalies.len(), 2);
        let values: Vec<f64> = anomalies.iter().map(|a| a.value).collect();
        assert_eq!(values, [17.0, 3.0]);
        for a in &anomalies {
            assert!((a.deviation - 5.0).abs() < 1e-9, "deviation {}", a.deviation);
        }
    }

    #[test]
    fn higher_k_flags_nothing() {
        let rows = join_rows(&series("temperature", &base_with_outliers()));
        assert!(detect(&rows, "temperature", 5.5).is_empty());
    }

    #[test]
    fn constant_series_has_no_anomalies() {
        let rows = join_rows(&series("utilization", &[42.0; 20]));
        assert!(detect(&rows, "utilization", 2.0).is_empty());
    }

    #[test]
    fn missing_metric_has_no_anomalies() {
        let rows = join_rows(&series("utilization", &[1.0, 2.0, 50.0]));
        assert!(detect(&rows, "temperature", 1.0).is_empty());
    }
}
