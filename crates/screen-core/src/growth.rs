//! Growth and trend utilities for quarterly fundamental series.
//!
//! Every function here is pure and returns `None` where the value is undefined
//! (zero or missing base, too few points) instead of producing NaN or infinity.
//! Downstream scoring decides how an undefined value is treated.

/// Minimum number of points required before a trend slope is defined.
pub const TREND_WINDOW: usize = 5;

/// Round to two decimal places (half away from zero).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage change from `previous` to `current`, rounded to 2 decimals.
/// Undefined when the base is zero or absent.
pub fn growth(current: f64, previous: Option<f64>) -> Option<f64> {
    let previous = previous?;
    if previous == 0.0 {
        return None;
    }
    let pct = (current - previous) / previous * 100.0;
    if pct.is_finite() {
        Some(round2(pct))
    } else {
        None
    }
}

/// Least-squares slope of `values` against index positions `0..n-1`,
/// rounded to 2 decimals. Undefined for fewer than [`TREND_WINDOW`] points.
pub fn trend_slope(values: &[f64]) -> Option<f64> {
    if values.len() < TREND_WINDOW {
        return None;
    }
    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }

    let slope = num / den;
    if slope.is_finite() {
        Some(round2(slope))
    } else {
        None
    }
}
