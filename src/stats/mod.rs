//! Latency distribution statistics


use crate::{
    error::{AppError, Result},
    models::Sample,
    types::LatencyLevel,
};
use serde::{Deserialize, Serialize};

/// Percentile of an ascending slice by linear interpolation between closest ranks
///
/// `index = p / 100 * (n - 1)`, the usual "linear" percentile definition.
pub fn percentile(sorted_values: &[f64], percentile: f64) -> Result<f64> {
    if sorted_values.is_empty() {
        return Err(AppError::statistics("Cannot compute a percentile of no samples"));
    }
    if !(0.0..=100.0).contains(&percentile) {
        return Err(AppError::statistics(format!(
            "Percentile must be between 0 and 100, got {}",
            percentile
        )));
    }

    let index = (percentile / 100.0) * (sorted_values.len() as f64 - 1.0);
    let lower_index = index.floor() as usize;
    let upper_index = index.ceil() as usize;

    if lower_index == upper_index {
        Ok(sorted_values[lower_index])
    } else {
        let lower_value = sorted_values[lower_index];
        let upper_value = sorted_values[upper_index];
        let weight = index - lower_index as f64;
        Ok(lower_value + weight * (upper_value - lower_value))
    }
}

/// One reported percentile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value_ms: f64,
}

impl PercentileValue {
    /// Whole milliseconds, ties rounded to even
    pub fn rounded_ms(&self) -> f64 {
        self.value_ms.round_ties_even()
    }

    pub fn label(&self) -> String {
        if self.percentile.fract() == 0.0 {
            format!("p{:.0}", self.percentile)
        } else {
            format!("p{}", self.percentile)
        }
    }

    pub fn level(&self) -> LatencyLevel {
        LatencyLevel::from_ms(self.value_ms)
    }
}

/// Summary of a latency distribution in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub count: usize,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    /// Sample standard deviation (n - 1)
    pub std_dev_ms: f64,
    pub percentiles: Vec<PercentileValue>,
}

impl LatencySummary {
    /// Summarise collected samples
    pub fn from_samples(samples: &[Sample], percentiles: &[f64]) -> Result<Self> {
        let latencies: Vec<f64> = samples.iter().map(Sample::latency_ms).collect();
        Self::from_latencies(&latencies, percentiles)
    }

    /// Summarise raw latencies in milliseconds, in any order
    pub fn from_latencies(latencies_ms: &[f64], percentiles: &[f64]) -> Result<Self> {
        if latencies_ms.is_empty() {
            return Err(AppError::statistics("No successful samples to summarise"));
        }
        if latencies_ms.iter().any(|v| !v.is_finite()) {
            return Err(AppError::statistics("Latencies must be finite"));
        }

        let mut sorted = latencies_ms.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean_ms = sorted.iter().sum::<f64>() / count as f64;

        let percentiles = percentiles
            .iter()
            .map(|&p| {
                Ok(PercentileValue {
                    percentile: p,
                    value_ms: percentile(&sorted, p)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            count,
            min_ms: sorted[0],
            max_ms: sorted[count - 1],
            mean_ms,
            std_dev_ms: standard_deviation(&sorted, mean_ms),
            percentiles,
        })
    }

    /// Value of a requested percentile, if it was computed
    pub fn get(&self, p: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|v| (v.percentile - p).abs() < f64::EPSILON)
            .map(|v| v.value_ms)
    }

    pub fn median_ms(&self) -> Option<f64> {
        self.get(50.0)
    }
}

fn standard_deviation(values: &[f64], mean: f64) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }

    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}
