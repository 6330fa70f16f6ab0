//! Threshold evaluation engine for GPU metrics.
//!
//! Pure logic: no store access. One evaluator handles any ordered severity
//! scale, so two-level and five-level deployments share the same code path.

use std::collections::HashMap;

use crate::alert::SeverityLevel;
use crate::config::{LevelBound, MonitorConfig};
use crate::error::CoreError;

/// The configured severity levels, least to most severe.
#[derive(Debug, Clone)]
pub struct SeverityScale {
    levels: Vec<SeverityLevel>,
}

impl SeverityScale {
    /// Build a scale from ordered level names.
    pub fn new(names: &[String]) -> Result<Self, CoreError> {
        if names.is_empty() {
            return Err(CoreError::Configuration(
                "at least one severity level is required".to_string(),
            ));
        }
        if names.len() > usize::from(u8::MAX) {
            return Err(CoreError::Configuration(format!(
                "too many severity levels ({})",
                names.len()
            )));
        }

        let mut levels: Vec<SeverityLevel> = Vec::with_capacity(names.len());
        for (rank, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(CoreError::Configuration(
                    "severity level names must not be empty".to_string(),
                ));
            }
            if levels.iter().any(|l| &l.name == name) {
                return Err(CoreError::Configuration(format!(
                    "duplicate severity level '{name}'"
                )));
            }
            // Bounded by the length check above.
            levels.push(SeverityLevel::new(rank as u8, name.clone()));
        }
        Ok(Self { levels })
    }

    /// The least severe level.
    pub fn baseline(&self) -> &SeverityLevel {
        &self.levels[0]
    }

    pub fn get(&self, name: &str) -> Option<&SeverityLevel> {
        self.levels.iter().find(|l| l.name == name)
    }

    /// Look up a level, failing with a configuration error if it is unknown.
    pub fn require(&self, name: &str) -> Result<&SeverityLevel, CoreError> {
        self.get(name)
            .ok_or_else(|| CoreError::Configuration(format!("unknown severity level '{name}'")))
    }

    pub fn levels(&self) -> &[SeverityLevel] {
        &self.levels
    }
}

/// Resolve the alertable minimum, which must be above the baseline.
pub fn resolve_min_alert_level(
    scale: &SeverityScale,
    name: &str,
) -> Result<SeverityLevel, CoreError> {
    let level = scale.require(name)?;
    if level.is_baseline() {
        return Err(CoreError::Configuration(format!(
            "min_alert_level '{name}' is the baseline level; nothing would ever be suppressed"
        )));
    }
    Ok(level.clone())
}

/// A resolved `(level, lower_bound)` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelThreshold {
    pub level: SeverityLevel,
    pub lower_bound: f64,
}

/// Result of classifying one value.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub level: SeverityLevel,
    /// Lower bound of the matched level; `None` when the value fell below
    /// every bound and was classified at the baseline.
    pub threshold: Option<f64>,
}

/// Maps `(metric, value)` to a severity level using per-metric bounds.
#[derive(Debug, Clone)]
pub struct ThresholdEvaluator {
    scale: SeverityScale,
    thresholds: HashMap<String, Vec<LevelThreshold>>,
}

impl ThresholdEvaluator {
    /// Build and validate an evaluator from configuration.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, CoreError> {
        let scale = SeverityScale::new(&config.severity_levels)?;
        let mut thresholds = HashMap::with_capacity(config.thresholds.len());
        for (metric, bounds) in &config.thresholds {
            let resolved = resolve_bounds(&scale, metric, bounds)?;
            thresholds.insert(metric.clone(), resolved);
        }
        Ok(Self { scale, thresholds })
    }

    pub fn scale(&self) -> &SeverityScale {
        &self.scale
    }

    pub fn is_configured(&self, metric_name: &str) -> bool {
        self.thresholds.contains_key(metric_name)
    }

    /// Classify `value` for `metric_name`.
    ///
    /// Returns the most severe level whose lower bound is `<= value`, or the
    /// baseline when the value is below every bound (NaN included). Fails
    /// with [`CoreError::Configuration`] if the metric has no levels.
    pub fn evaluate(&self, metric_name: &str, value: f64) -> Result<Classification, CoreError> {
        let levels = self.thresholds.get(metric_name).ok_or_else(|| {
            CoreError::Configuration(format!("no thresholds configured for '{metric_name}'"))
        })?;

        let matched = levels.iter().rev().find(|t| t.lower_bound <= value);
        Ok(match matched {
            Some(t) => Classification {
                level: t.level.clone(),
                threshold: Some(t.lower_bound),
            },
            None => Classification {
                level: self.scale.baseline().clone(),
                threshold: None,
            },
        })
    }
}

/// Resolve level names and enforce strictly increasing bound and severity.
fn resolve_bounds(
    scale: &SeverityScale,
    metric: &str,
    bounds: &[LevelBound],
) -> Result<Vec<LevelThreshold>, CoreError> {
    if bounds.is_empty() {
        return Err(CoreError::Configuration(format!(
            "metric '{metric}' has an empty threshold list"
        )));
    }

    let mut resolved: Vec<LevelThreshold> = Vec::with_capacity(bounds.len());
    for bound in bounds {
        if !bound.lower_bound.is_finite() {
            return Err(CoreError::Configuration(format!(
                "metric '{metric}': bound for '{}' must be finite",
                bound.level
            )));
        }
        let level = scale.require(&bound.level)?.clone();
        if let Some(prev) = resolved.last() {
            if bound.lower_bound <= prev.lower_bound {
                return Err(CoreError::Configuration(format!(
                    "metric '{metric}': bounds must be strictly increasing ({} after {})",
                    bound.lower_bound, prev.lower_bound
                )));
            }
            if level <= prev.level {
                return Err(CoreError::Configuration(format!(
                    "metric '{metric}': levels must be strictly increasing ('{}' after '{}')",
                    level, prev.level
                )));
            }
        }
        resolved.push(LevelThreshold {
            level,
            lower_bound: bound.lower_bound,
        });
    }
    Ok(resolved)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric_names::{METRIC_FAN_SPEED, METRIC_MEMORY_USAGE, METRIC_TEMPERATURE};
    use assert_matches::assert_matches;

    fn default_evaluator() -> ThresholdEvaluator {
        ThresholdEvaluator::from_config(&MonitorConfig::default()).unwrap()
    }

    #[test]
    fn below_all_bounds_is_baseline() {
        let evaluator = default_evaluator();
        for value in [-40.0, 0.0, 25.5, 79.999] {
            let c = evaluator.evaluate(METRIC_TEMPERATURE, value).unwrap();
            assert!(c.level.is_baseline(), "{value} should be baseline");
            assert_eq!(c.threshold, None);
        }
    }

    #[test]
    fn warning_on_high_temperature() {
        let c = default_evaluator().evaluate(METRIC_TEMPERATURE, 85.0).unwrap();
        assert_eq!(c.level.name, "warning");
        assert_eq!(c.threshold, Some(80.0));
    }

    #[test]
    fn critical_on_very_high_temperature() {
        let c = default_evaluator().evaluate(METRIC_TEMPERATURE, 92.0).unwrap();
        assert_eq!(c.level.name, "critical");
        assert_eq!(c.threshold, Some(90.0));
    }

    #[test]
    fn bound_is_inclusive() {
        let c = default_evaluator().evaluate(METRIC_TEMPERATURE, 90.0).unwrap();
        assert_eq!(c.level.name, "critical");
    }

    #[test]
    fn unconfigured_metric_is_configuration_error() {
        let result = default_evaluator().evaluate("hotspot_temperature", 100.0);
        assert_matches!(result, Err(CoreError::Configuration(_)));
    }

    #[test]
    fn nan_is_baseline() {
        let c = default_evaluator().evaluate(METRIC_TEMPERATURE, f64::NAN).unwrap();
        assert!(c.level.is_baseline());
    }

    #[test]
    fn evaluation_is_monotonic() {
        for config in [MonitorConfig::default(), MonitorConfig::five_level()] {
            let evaluator = ThresholdEvaluator::from_config(&config).unwrap();
            for metric in [METRIC_TEMPERATURE, METRIC_MEMORY_USAGE, METRIC_FAN_SPEED] {
                let mut previous = evaluator.evaluate(metric, -10.0).unwrap().level;
                let mut value = -10.0;
                while value <= 120.0 {
                    let current = evaluator.evaluate(metric, value).unwrap().level;
                    assert!(current >= previous, "{metric} dropped at {value}");
                    previous = current;
                    value += 0.25;
                }
            }
        }
    }

    #[test]
    fn five_level_scale_classifies_every_band() {
        let evaluator = ThresholdEvaluator::from_config(&MonitorConfig::five_level()).unwrap();
        let names: Vec<String> = [20.0, 45.0, 70.0, 85.0, 95.0]
            .iter()
            .map(|v| evaluator.evaluate(METRIC_TEMPERATURE, *v).unwrap().level.name)
            .collect();
        assert_eq!(names, ["ideal", "good", "caution", "warning", "critical"]);
    }

    #[test]
    fn duplicate_levels_rejected() {
        let names = vec!["normal".to_string(), "normal".to_string()];
        assert_matches!(SeverityScale::new(&names), Err(CoreError::Configuration(_)));
    }

    #[test]
    fn out_of_order_levels_rejected() {
        let scale = SeverityScale::new(&MonitorConfig::default().severity_levels).unwrap();
        let bounds = vec![
            LevelBound::new("critical", 50.0),
            LevelBound::new("warning", 60.0),
        ];
        assert_matches!(
            resolve_bounds(&scale, METRIC_TEMPERATURE, &bounds),
            Err(CoreError::Configuration(_))
        );
    }
}
