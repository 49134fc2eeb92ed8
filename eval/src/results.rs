// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Per-trial result accumulation and mean/standard deviation summaries

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Values collected for one metric, one per trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub name: String,
    pub values: Vec<f64>,
}

impl MetricSeries {
    pub fn mean(&self) -> Result<f64> {
        mean(&self.name, &self.values)
    }

    pub fn stdev(&self) -> Result<f64> {
        sample_stdev(&self.name, &self.values)
    }
}

/// Arithmetic mean; needs at least one value
pub fn mean(name: &str, values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(Error::InsufficientSamples {
            metric: name.to_string(),
            samples: 0,
            required: 1,
        });
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); needs at least two values
pub fn sample_stdev(name: &str, values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(Error::InsufficientSamples {
            metric: name.to_string(),
            samples: values.len(),
            required: 2,
        });
    }
    let m = mean(name, values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Ok((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Summary statistics for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub name: String,
    pub samples: usize,
    pub mean: f64,
    /// `None` when fewer than two samples were collected
    pub stdev: Option<f64>,
}

/// Metric name to per-trial values, in first-seen name order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsAccumulator {
    series: Vec<MetricSeries>,
}

impl ResultsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one value under `name`
    pub fn add(&mut self, name: &str, value: f64) {
        match self.series.iter_mut().find(|s| s.name == name) {
            Some(series) => series.values.push(value),
            None => self.series.push(MetricSeries {
                name: name.to_string(),
                values: vec![value],
            }),
        }
    }

    /// Append a batch of values, typically everything one trial produced
    pub fn extend<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        for (name, value) in values {
            self.add(&name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.values.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.name.as_str())
    }

    pub fn series(&self) -> &[MetricSeries] {
        &self.series
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Number of distinct metric names
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Number of trials recorded, i.e. the longest series length
    pub fn trials(&self) -> usize {
        self.series.iter().map(|s| s.values.len()).max().unwrap_or(0)
    }

    /// Mean and standard deviation per metric, in insertion order.
    ///
    /// Series with a single value get `stdev: None` instead of a number.
    pub fn finalize(&self) -> Result<Vec<MetricSummary>> {
        let mut summaries = Vec::with_capacity(self.series.len());

        for series in &self.series {
            let mean = series.mean()?;
            let stdev = match series.stdev() {
                Ok(stdev) => Some(stdev),
                Err(Error::InsufficientSamples { samples, .. }) => {
                    tracing::warn!(
                        "Standard deviation of {} skipped: only {} sample(s)",
                        series.name,
                        samples
                    );
                    None
                }
                Err(e) => return Err(e),
            };

            summaries.push(MetricSummary {
                name: series.name.clone(),
                samples: series.values.len(),
                mean,
                stdev,
            });
        }

        Ok(summaries)
    }
}
