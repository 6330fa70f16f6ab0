//! Percentage metrics derived from two raw fields (memory used / total,
//! power draw / limit).

use crate::config::DerivedMetric;
use crate::metrics::EntityReading;

/// Outcome of a percentage computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Computed(f64),
    /// The denominator was zero. Callers skip alerting for the sample.
    Degenerate,
}

impl Ratio {
    /// The computed percentage, or `0.0` for a degenerate ratio.
    pub fn value(self) -> f64 {
        match self {
            Ratio::Computed(v) => v,
            Ratio::Degenerate => 0.0,
        }
    }

    pub fn is_degenerate(self) -> bool {
        matches!(self, Ratio::Degenerate)
    }
}

/// `numerator / denominator * 100`, never dividing by zero.
pub fn percentage(numerator: f64, denominator: f64) -> Ratio {
    if denominator == 0.0 {
        return Ratio::Degenerate;
    }
    Ratio::Computed(numerator / denominator * 100.0)
}

/// Derives the configured ratio metrics from raw readings.
#[derive(Debug, Clone, Default)]
pub struct RatioComputer {
    definitions: Vec<DerivedMetric>,
}

impl RatioComputer {
    pub fn new(definitions: Vec<DerivedMetric>) -> Self {
        Self { definitions }
    }

    /// The derivation for `metric_name`, if it is a ratio metric.
    pub fn definition(&self, metric_name: &str) -> Option<&DerivedMetric> {
        self.definitions.iter().find(|d| d.name == metric_name)
    }

    /// Compute a derived metric from a reading.
    ///
    /// Returns `None` when either operand is missing from the reading.
    pub fn compute(&self, definition: &DerivedMetric, reading: &EntityReading) -> Option<Ratio> {
        let numerator = reading.get(&definition.numerator)?;
        let denominator = reading.get(&definition.denominator)?;
        Some(percentage(numerator, denominator))
    }
}
