//! Usage patterns: grouped averages, peaks, and the utilization histogram.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use serde::Serialize;

use super::stats::MeanAccumulator;
use super::{GroupedAverages, SampleRow};
use crate::metric_names::METRIC_UTILIZATION;
use crate::types::{EntityId, Timestamp};

/// Utilization histogram edges. Bins are `[lo, hi)` except the last, which
/// also includes 100.
const UTILIZATION_BINS: [(f64, f64, &str); 5] = [
    (0.0, 20.0, "0-20%"),
    (20.0, 40.0, "21-40%"),
    (40.0, 60.0, "41-60%"),
    (60.0, 80.0, "61-80%"),
    (80.0, 100.0, "81-100%"),
];

/// The single highest sample of a metric in the range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakPoint {
    pub metric: String,
    pub entity_id: EntityId,
    pub value: f64,
    pub timestamp: Timestamp,
}

/// Count of utilization samples in one bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionBin {
    pub label: &'static str,
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

/// Mean per metric per hour of day (0-23, UTC).
pub fn hourly_averages(rows: &[SampleRow], metrics: &[String]) -> GroupedAverages {
    grouped_averages(rows, metrics, |ts| ts.hour())
}

/// Mean per metric per day of week (0-6, Monday = 0).
pub fn daily_averages(rows: &[SampleRow], metrics: &[String]) -> GroupedAverages {
    grouped_averages(rows, metrics, |ts| ts.weekday().num_days_from_monday())
}

fn grouped_averages(
    rows: &[SampleRow],
    metrics: &[String],
    group_of: impl Fn(&Timestamp) -> u32,
) -> GroupedAverages {
    let mut acc: BTreeMap<&str, BTreeMap<u32, MeanAccumulator>> = BTreeMap::new();
    for row in rows {
        let group = group_of(&row.timestamp);
        for metric in metrics {
            if let Some(value) = row.get(metric) {
                acc.entry(metric.as_str())
                    .or_default()
                    .entry(group)
                    .or_default()
                    .add(value);
            }
        }
    }

    acc.into_iter()
        .map(|(metric, groups)| {
            let means = groups
                .into_iter()
                .filter_map(|(group, a)| a.mean().map(|m| (group, m)))
                .collect();
            (metric.to_string(), means)
        })
        .collect()
}

/// Maximum sample per metric; ties keep the earliest row.
pub fn peak_points(rows: &[SampleRow], metrics: &[String]) -> Vec<PeakPoint> {
    metrics
        .iter()
        .filter_map(|metric| {
            let mut best: Option<(&SampleRow, f64)> = None;
            for row in rows {
                let Some(value) = row.get(metric) else {
                    continue;
                };
                if value.is_nan() {
                    continue;
                }
                match best {
                    Some((_, current)) if value <= current => {}
                    _ => best = Some((row, value)),
                }
            }
            best.map(|(row, value)| PeakPoint {
                metric: metric.clone(),
                entity_id: row.entity_id,
                value,
                timestamp: row.timestamp,
            })
        })
        .collect()
}

/// Histogram of utilization values. Values outside `[0, 100]` are excluded.
pub fn utilization_distribution(rows: &[SampleRow]) -> Vec<DistributionBin> {
    let values: Vec<f64> = rows.iter().filter_map(|r| r.get(METRIC_UTILIZATION)).collect();
    if values.is_empty() {
        return Vec::new();
    }
    bucket_utilization(&values)
}

pub fn bucket_utilization(values: &[f64]) -> Vec<DistributionBin> {
    let mut bins: Vec<DistributionBin> = UTILIZATION_BINS
        .iter()
        .map(|(lower, upper, label)| DistributionBin {
            label,
            lower: *lower,
            upper: *upper,
            count: 0,
        })
        .collect();

    let last = bins.len() - 1;
    for value in values {
        let slot = bins.iter().position(|b| *value >= b.lower && *value < b.upper);
        let slot = match slot {
            Some(i) => Some(i),
            None if *value == bins[last].upper => Some(last),
            None => None,
        };
        if let Some(i) = slot {
            bins[i].count += 1;
        }
    }
    bins
}
