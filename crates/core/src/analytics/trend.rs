//! Least-squares trend analysis with a two-sided significance test.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Below this p-value a trend is reported as significant.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Minimum number of points for a regression with a usable p-value.
pub const MIN_TREND_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub direction: TrendDirection,
    pub significant: bool,
    pub samples: usize,
}

/// Fit `y = slope * i + intercept` over the sample index `i`.
///
/// Returns `None` with fewer than [`MIN_TREND_POINTS`] finite values.
pub fn linear_trend(values: &[f64]) -> Option<TrendResult> {
    let ys: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let n = ys.len();
    if n < MIN_TREND_POINTS {
        return None;
    }

    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = ys.iter().sum::<f64>() / nf;

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        let dy = y - y_mean;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if syy == 0.0 {
        return Some(TrendResult {
            slope: 0.0,
            intercept: y_mean,
            r_squared: 0.0,
            p_value: 1.0,
            direction: TrendDirection::Flat,
            significant: false,
            samples: n,
        });
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let r = sxy / (sxx * syy).sqrt();
    let r_squared = (r * r).min(1.0);
    let p_value = p_value(r, r_squared, n);

    let direction = if slope > 0.0 {
        TrendDirection::Increasing
    } else if slope < 0.0 {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Flat
    };

    Some(TrendResult {
        slope,
        intercept,
        r_squared,
        p_value,
        direction,
        significant: p_value < SIGNIFICANCE_LEVEL,
        samples: n,
    })
}

fn p_value(r: f64, r_squared: f64, n: usize) -> f64 {
    if r_squared >= 1.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r_squared)).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}
