//! Per-stop sample extraction, standardization, and summary statistics.

use serde::Serialize;

use crate::error::FitError;
use crate::input::ArrivalRow;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn population_stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Linearly interpolated percentile of ascending-sorted values, `q` in 0..=100.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    assert!(!sorted.is_empty(), "percentile of empty slice");
    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// `count` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![start];
    }
    let step = (end - start) / (count - 1) as f64;
    (0..count).map(|i| start + step * i as f64).collect()
}

/// Inter-arrival times observed at one stop, in original row order,
/// together with their z-score standardization.
#[derive(Debug, Clone)]
pub struct StopSample {
    pub stop_id: i64,
    pub raw: Vec<f64>,
    pub standardized: Vec<f64>,
}

impl StopSample {
    /// Filters the arrival table by exact stop id and standardizes the
    /// `Ai` column to zero mean and unit population variance.
    pub fn extract(rows: &[ArrivalRow], stop_id: i64) -> Result<Self, FitError> {
        let raw: Vec<f64> = rows
            .iter()
            .filter(|r| r.stop_id == stop_id)
            .map(|r| r.ai)
            .collect();

        if raw.is_empty() {
            return Err(FitError::EmptySample { stop_id });
        }

        let m = mean(&raw);
        let sd = population_stddev(&raw, m);
        if sd == 0.0 {
            return Err(FitError::ConstantSample {
                stop_id,
                count: raw.len(),
            });
        }

        let standardized = raw.iter().map(|x| (x - m) / sd).collect();

        Ok(StopSample {
            stop_id,
            raw,
            standardized,
        })
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Summary of a raw sample in the shape of pandas `describe()`:
/// count, mean, sample standard deviation, min, quartiles, max.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl DescriptiveStats {
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let m = mean(values);
        let n = values.len();
        // sample stddev (ddof = 1), matching the pandas summary
        let std = if n < 2 {
            0.0
        } else {
            (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
        };

        DescriptiveStats {
            count: n,
            mean: m,
            std,
            min: sorted[0],
            q25: percentile(&sorted, 25.0),
            median: percentile(&sorted, 50.0),
            q75: percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }
}
