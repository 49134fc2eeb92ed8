// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Error types for the benchmarking harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid trial count {0}: at least one trial is required")]
    InvalidTrialCount(usize),

    #[error("Algorithm '{algorithm}' failed: {reason}")]
    AlgorithmRunFailure { algorithm: String, reason: String },

    #[error("Metric '{metric}' failed: {reason}")]
    MetricComputationFailure { metric: String, reason: String },

    #[error("Metric '{metric}' has {samples} sample(s), at least {required} required")]
    InsufficientSamples {
        metric: String,
        samples: usize,
        required: usize,
    },

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Duplicate name in registry: {0}")]
    DuplicateName(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load dataset '{dataset}': {reason}")]
    DatasetLoad { dataset: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn algorithm(algorithm: &str, reason: impl Into<String>) -> Self {
        Error::AlgorithmRunFailure {
            algorithm: algorithm.to_string(),
            reason: reason.into(),
        }
    }

    pub fn metric(metric: &str, reason: impl Into<String>) -> Self {
        Error::MetricComputationFailure {
            metric: metric.to_string(),
            reason: reason.into(),
        }
    }

    /// Failures confined to a single algorithm-trial unit.
    ///
    /// These are the only errors a sweep with failure isolation enabled will
    /// record and step over; everything else stays fatal.
    pub fn is_unit_failure(&self) -> bool {
        matches!(
            self,
            Error::AlgorithmRunFailure { .. } | Error::MetricComputationFailure { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
