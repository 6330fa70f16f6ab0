//! Power and memory efficiency ratios.

use serde::Serialize;

use super::stats::MeanAccumulator;
use super::SampleRow;
use crate::hardware::ratio::{percentage, Ratio};
use crate::metric_names::{
    METRIC_MEMORY_TOTAL, METRIC_MEMORY_USED, METRIC_POWER_DRAW, METRIC_UTILIZATION,
};

/// Mean and peak of a per-row ratio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioSummary {
    pub average: f64,
    pub peak: f64,
    pub samples: usize,
}

/// Efficiency figures. A field is absent when no row carried valid operands.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EfficiencyMetrics {
    /// Utilization percent per watt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_efficiency: Option<RatioSummary>,
    /// Memory used as a percentage of memory total.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_efficiency: Option<RatioSummary>,
}

#[derive(Default)]
struct SummaryBuilder {
    mean: MeanAccumulator,
    peak: Option<f64>,
    samples: usize,
}

impl SummaryBuilder {
    fn add(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.mean.add(value);
        self.peak = Some(self.peak.map_or(value, |p| p.max(value)));
        self.samples += 1;
    }

    fn finish(self) -> Option<RatioSummary> {
        Some(RatioSummary {
            average: self.mean.mean()?,
            peak: self.peak?,
            samples: self.samples,
        })
    }
}

/// Rows with a zero denominator are skipped rather than counted as zero.
pub fn compute(rows: &[SampleRow]) -> EfficiencyMetrics {
    let mut power = SummaryBuilder::default();
    let mut memory = SummaryBuilder::default();

    for row in rows {
        if let (Some(util), Some(watts)) = (row.get(METRIC_UTILIZATION), row.get(METRIC_POWER_DRAW))
        {
            if watts != 0.0 {
                power.add(util / watts);
            }
        }
        if let (Some(used), Some(total)) = (row.get(METRIC_MEMORY_USED), row.get(METRIC_MEMORY_TOTAL))
        {
            if let Ratio::Computed(pct) = percentage(used, total) {
                memory.add(pct);
            }
        }
    }

    EfficiencyMetrics {
        power_efficiency: power.finish(),
        memory_efficiency: memory.finish(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::join_rows;
    use super::super::test_support::*;
    use super::*;
    use chrono::Duration;

    #[test]
    fn averages_and_peaks() {
        let t = epoch();
        let t1 = t + Duration::seconds(5);
        let samples = vec![
            sample(0, "utilization", 50.0, t),
            sample(0, "power_draw", 100.0, t),
            sample(0, "memory_used", 4096.0, t),
            sample(0, "memory_total", 8192.0, t),
            sample(0, "utilization", 90.0, t1),
            sample(0, "power_draw", 100.0, t1),
        ];
        let eff = compute(&join_rows(&samples));

        let power = eff.power_efficiency.unwrap();
        assert!((power.average - 0.7).abs() < 1e-12);
        assert!((power.peak - 0.9).abs() < 1e-12);
        assert_eq!(power.samples, 2);

        let memory = eff.memory_efficiency.unwrap();
        assert_eq!(memory.average, 50.0);
        assert_eq!(memory.samples, 1);
    }

    #[test]
    fn zero_denominators_are_skipped() {
        let t = epoch();
        let samples = vec![
            sample(0, "utilization", 50.0, t),
            sample(0, "power_draw", 0.0, t),
            sample(0, "memory_used", 100.0, t),
            sample(0, "memory_total", 0.0, t),
        ];
        assert_eq!(compute(&join_rows(&samples)), EfficiencyMetrics::default());
    }

    #[test]
    fn absent_summaries_are_not_serialized() {
        let json = serde_json::to_value(EfficiencyMetrics::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
