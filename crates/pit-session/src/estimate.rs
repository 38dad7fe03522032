//! Completion estimate for the primary probe.
//!
//! Fits a least-squares line to probe 1 over the trailing window and
//! extrapolates to the alarm target. A flat or falling trend, too few
//! samples, a disconnected probe, or no target yields `None`.

use crate::types::Reading;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimateParams {
    /// Number of trailing readings considered.
    pub window: usize,
    /// Fewer probe-1 values than this inside the window gives no estimate.
    pub min_samples: usize,
    /// Slopes at or below this (°F/s) count as not rising.
    pub min_slope: f64,
}

impl Default for EstimateParams {
    fn default() -> Self {
        Self {
            window: 60,
            min_samples: 10,
            min_slope: 1e-5,
        }
    }
}

/// Estimated unix time at which probe 1 reaches `target`.
pub fn estimate_done(
    readings: &[Reading],
    target: Option<f64>,
    params: &EstimateParams,
) -> Option<i64> {
    let target = target.filter(|t| t.is_finite())?;
    if readings.last()?.meat1.is_none() {
        return None;
    }

    let window = &readings[readings.len().saturating_sub(params.window)..];
    let points: Vec<(i64, f64)> = window
        .iter()
        .filter_map(|r| r.meat1.map(|m| (r.ts, m)))
        .collect();
    if points.len() < params.min_samples.max(2) {
        return None;
    }

    let slope = least_squares_slope(&points)?;
    if slope <= params.min_slope {
        return None;
    }

    let &(last_ts, last_temp) = points.last()?;
    let remaining = target - last_temp;
    if remaining <= 0.0 {
        return Some(last_ts);
    }
    Some(last_ts + (remaining / slope).floor() as i64)
}

/// Slope of the ordinary least-squares fit, or `None` when every sample
/// shares one timestamp.
fn least_squares_slope(points: &[(i64, f64)]) -> Option<f64> {
    let origin = points.first()?.0;
    let n = points.len() as f64;
    let (sum_x, sum_y) = points.iter().fold((0.0, 0.0), |(sx, sy), &(ts, y)| {
        (sx + (ts - origin) as f64, sy + y)
    });
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;

    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(ts, y)| {
        let dx = (ts - origin) as f64 - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });
    if sxx <= 0.0 {
        return None;
    }
    Some(sxy / sxx)
}
