// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Benchmarking harness for fairness-aware classification algorithms
//!
//! This crate provides:
//! - Dataset descriptors and processed datasets (full and numerical shapes)
//! - Reproducible multi-trial train/test splits with seeded randomness
//! - Pluggable algorithms (Majority, Stratified, Naive Bayes, Two Naive Bayes, Logistic Regression)
//! - Accuracy and fairness metrics (Disparate Impact, Calders-Verwer, TPR difference)
//! - Per-trial result accumulation with mean / standard deviation summaries
//! - A benchmark pipeline with text, JSON and markdown reports

pub mod algorithms;
pub mod datasets;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod registry;
pub mod results;
pub mod table;

pub use algorithms::{
    Algorithm, LogisticRegression, MajorityBaseline, NaiveBayes, Params, StratifiedBaseline, TwoNaiveBayes,
};
pub use datasets::{DataSource, DatasetDescriptor, ProcessedData, Split, SplitConfig};
pub use error::{Error, Result};
pub use metrics::{Accuracy, BalancedAccuracy, CaldersVerwer, DisparateImpact, FairnessMetric, Metric, TprDifference};
pub use pipeline::{BenchmarkConfig, BenchmarkPipeline, BenchmarkReport, DataShape, TrialRunner};
pub use registry::{fairness_metric_key, Registry};
pub use results::{MetricSummary, ResultsAccumulator};
pub use table::{Column, Table, Value};
