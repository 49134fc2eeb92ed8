// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Reproducible benchmarking pipeline
//!
//! Orchestrates:
//! - Dataset selection and loading
//! - Paired full / numerical train-test splits per trial
//! - Algorithm dispatch and per-trial metric evaluation
//! - Mean / standard deviation aggregation
//! - Results serialization

use crate::algorithms::{Algorithm, Params};
use crate::datasets::{DatasetDescriptor, ProcessedData, Split, SplitConfig};
use crate::error::{Error, Result};
use crate::metrics::{FairnessMetric, Metric};
use crate::registry::{fairness_metric_key, Registry};
use crate::results::{MetricSummary, ResultsAccumulator};
use crate::table::Value;
use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub const NUM_TRIALS_DEFAULT: usize = 10;

/// Configuration for a benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Number of randomized train/test trials per dataset
    pub num_trials: usize,
    /// Datasets to evaluate (empty = all registered)
    pub dataset_names: Vec<String>,
    /// Split seed and train fraction
    pub split: SplitConfig,
    /// Directory holding preprocessed CSV files
    pub data_dir: PathBuf,
    /// Hyperparameters per algorithm name
    pub algorithm_params: BTreeMap<String, Params>,
    /// Record algorithm/metric failures per trial instead of aborting
    pub isolate_failures: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            num_trials: NUM_TRIALS_DEFAULT,
            dataset_names: vec![],
            split: SplitConfig::default(),
            data_dir: PathBuf::from("data/preprocessed"),
            algorithm_params: BTreeMap::new(),
            isolate_failures: false,
        }
    }
}

impl BenchmarkConfig {
    /// Set one hyperparameter from `<algorithm>.<key>=<value>`
    pub fn set_param(&mut self, assignment: &str) -> Result<()> {
        let invalid = || Error::InvalidConfig(format!("expected <algorithm>.<key>=<value>, got '{}'", assignment));

        let (target, raw_value) = assignment.split_once('=').ok_or_else(invalid)?;
        let (algorithm, key) = target.split_once('.').ok_or_else(invalid)?;
        let (algorithm, key) = (algorithm.trim(), key.trim());
        if algorithm.is_empty() || key.is_empty() {
            return Err(invalid());
        }

        let value: f64 = raw_value
            .trim()
            .parse()
            .map_err(|_| Error::InvalidConfig(format!("parameter value '{}' is not a number", raw_value)))?;

        self.algorithm_params
            .entry(algorithm.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn validate(&self, registry: &Registry) -> Result<()> {
        if self.num_trials < 1 {
            return Err(Error::InvalidTrialCount(self.num_trials));
        }
        self.split.validate()?;

        for algorithm in self.algorithm_params.keys() {
            if !registry.algorithms().iter().any(|a| a.name() == algorithm) {
                return Err(Error::InvalidConfig(format!(
                    "parameters given for unknown algorithm '{}'",
                    algorithm
                )));
            }
        }
        Ok(())
    }
}

/// Which data shape a trial was evaluated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataShape {
    /// All original feature types
    Full,
    /// Numerically encoded features only
    Numerical,
}

impl fmt::Display for DataShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataShape::Full => f.write_str("all data"),
            DataShape::Numerical => f.write_str("numerical"),
        }
    }
}

/// One sensitive column of a test table
struct SensitiveColumn<'t> {
    attribute: &'t str,
    values: &'t [Value],
    privileged: &'t [Value],
}

/// Evaluates one algorithm on one split and scores the predictions
pub struct TrialRunner<'a> {
    descriptor: &'a DatasetDescriptor,
    metrics: &'a [Box<dyn Metric>],
    fairness_metrics: &'a [Box<dyn FairnessMetric>],
}

impl<'a> TrialRunner<'a> {
    pub fn new(descriptor: &'a DatasetDescriptor, registry: &'a Registry) -> Self {
        Self::with_metrics(descriptor, registry.metrics(), registry.fairness_metrics())
    }

    pub fn with_metrics(
        descriptor: &'a DatasetDescriptor,
        metrics: &'a [Box<dyn Metric>],
        fairness_metrics: &'a [Box<dyn FairnessMetric>],
    ) -> Self {
        Self {
            descriptor,
            metrics,
            fairness_metrics,
        }
    }

    /// Run the algorithm and compute every metric, without touching any accumulator.
    ///
    /// Every configured sensitive attribute is evaluated: fairness metric
    /// values are keyed `<metric>-<attribute>`. Sensitive columns stay in the
    /// tables handed to the algorithm.
    pub fn evaluate(
        &self,
        algorithm: &dyn Algorithm,
        split: &Split,
        params: &Params,
    ) -> Result<Vec<(String, f64)>> {
        let class_attribute = self.descriptor.class_attribute();
        let actual = split.test.require_column(class_attribute)?;

        let sensitive = self
            .descriptor
            .sensitive_attributes()
            .iter()
            .map(|attribute| {
                Ok(SensitiveColumn {
                    attribute,
                    values: split.test.require_column(attribute)?,
                    privileged: self.descriptor.privileged_values_for(attribute),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let predicted = algorithm
            .run(
                &split.train,
                &split.test,
                class_attribute,
                self.descriptor.sensitive_attributes(),
                params,
            )
            .map_err(|e| match e {
                Error::AlgorithmRunFailure { .. } => e,
                other => Error::algorithm(algorithm.name(), other.to_string()),
            })?;

        if predicted.len() != actual.len() {
            return Err(Error::algorithm(
                algorithm.name(),
                format!(
                    "returned {} predictions for {} test rows",
                    predicted.len(),
                    actual.len()
                ),
            ));
        }

        let positive = self.descriptor.positive_class_value();
        let mut staged =
            Vec::with_capacity(self.metrics.len() + self.fairness_metrics.len() * sensitive.len());

        for metric in self.metrics {
            let value = metric.calc(actual, &predicted).map_err(|e| as_metric_failure(metric.name(), e))?;
            staged.push((metric.name().to_string(), value));
        }

        for metric in self.fairness_metrics {
            for column in &sensitive {
                let key = fairness_metric_key(metric.name(), column.attribute);
                let value = metric
                    .calc(actual, &predicted, column.values, column.privileged, positive)
                    .map_err(|e| as_metric_failure(&key, e))?;
                staged.push((key, value));
            }
        }

        Ok(staged)
    }

    /// Evaluate one trial and append its values to `accumulator`.
    ///
    /// Values are committed only when every metric succeeded, so a failed
    /// trial leaves the accumulator untouched.
    pub fn run_trial(
        &self,
        algorithm: &dyn Algorithm,
        split: &Split,
        params: &Params,
        accumulator: &mut ResultsAccumulator,
    ) -> Result<()> {
        let staged = self.evaluate(algorithm, split, params)?;
        accumulator.extend(staged);
        Ok(())
    }
}

fn as_metric_failure(metric: &str, error: Error) -> Error {
    match error {
        Error::MetricComputationFailure { .. } => error,
        other => Error::metric(metric, other.to_string()),
    }
}

/// A trial skipped because of an isolated failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialFailure {
    pub shape: DataShape,
    pub trial: usize,
    pub error: String,
}

/// Results of one algorithm on one dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmReport {
    pub algorithm: String,
    pub description: String,
    pub numerical_only: bool,
    /// Uses the sensitive attributes when fitting
    pub fairness_aware: bool,
    pub numerical: Vec<MetricSummary>,
    /// Empty for numerical-only algorithms
    pub full: Vec<MetricSummary>,
    /// Raw per-trial values
    pub numerical_results: ResultsAccumulator,
    pub full_results: ResultsAccumulator,
    pub failures: Vec<TrialFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetReport {
    pub dataset: String,
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub algorithms: Vec<AlgorithmReport>,
}

/// Complete benchmark results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub config: BenchmarkConfig,
    pub datasets: Vec<DatasetReport>,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

fn format_summaries(output: &mut String, indent: &str, summaries: &[MetricSummary]) {
    for summary in summaries {
        output.push_str(&format!("{}average {}: {}\n", indent, summary.name, summary.mean));
        match summary.stdev {
            Some(stdev) => output.push_str(&format!("{}stdev {}: {}\n", indent, summary.name, stdev)),
            None => output.push_str(&format!(
                "{}stdev {}: n/a (needs at least 2 trials)\n",
                indent, summary.name
            )),
        }
    }
}

impl BenchmarkReport {
    /// Format as human-readable text, one mean and one stdev line per metric
    pub fn format(&self) -> String {
        let mut output = String::new();

        for dataset in &self.datasets {
            output.push_str(&format!(
                "\nEvaluating dataset: {} ({} rows, {} train / {} test per trial)\n",
                dataset.dataset, dataset.rows, dataset.train_rows, dataset.test_rows
            ));

            for algorithm in &dataset.algorithms {
                output.push_str(&format!("    Algorithm: {}\n", algorithm.algorithm));

                output.push_str(&format!("      [{}]\n", DataShape::Numerical));
                format_summaries(&mut output, "        ", &algorithm.numerical);

                if !algorithm.numerical_only {
                    output.push_str(&format!("      [{}]\n", DataShape::Full));
                    format_summaries(&mut output, "        ", &algorithm.full);
                }

                for failure in &algorithm.failures {
                    output.push_str(&format!(
                        "      failed trial {} ({}): {}\n",
                        failure.trial, failure.shape, failure.error
                    ));
                }
            }
        }

        output
    }
}

/// Main benchmark pipeline
pub struct BenchmarkPipeline<'r> {
    config: BenchmarkConfig,
    registry: &'r Registry,
    progress: ProgressBar,
}

impl<'r> BenchmarkPipeline<'r> {
    pub fn new(config: BenchmarkConfig, registry: &'r Registry) -> Self {
        Self {
            config,
            registry,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report progress per algorithm trial on the given bar
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Registered datasets matching the configured names, in registry order.
    ///
    /// Requested names that match nothing are skipped.
    pub fn selected_datasets(&self) -> Vec<&'r DatasetDescriptor> {
        for name in &self.config.dataset_names {
            if !self.registry.datasets().iter().any(|d| d.name() == name) {
                tracing::debug!("Dataset '{}' is not registered, skipping", name);
            }
        }

        self.registry
            .datasets()
            .iter()
            .filter(|d| {
                self.config.dataset_names.is_empty()
                    || self.config.dataset_names.iter().any(|n| n == d.name())
            })
            .collect()
    }

    /// Run the full benchmark sweep
    pub fn run(&self) -> Result<BenchmarkReport> {
        self.config.validate(self.registry)?;

        let selected = self.selected_datasets();
        self.progress.set_length(
            (selected.len() * self.registry.algorithms().len() * self.config.num_trials) as u64,
        );

        let mut datasets = Vec::with_capacity(selected.len());
        for descriptor in selected {
            tracing::info!("Evaluating dataset: {}", descriptor.name());
            let data = ProcessedData::open(descriptor, &self.config.data_dir)?;
            datasets.push(self.run_dataset(&data)?);
        }
        self.progress.finish_and_clear();

        Ok(BenchmarkReport {
            config: self.config.clone(),
            datasets,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Evaluate every registered algorithm on one processed dataset
    pub fn run_dataset(&self, data: &ProcessedData) -> Result<DatasetReport> {
        let (full_splits, numerical_splits) =
            data.create_train_test_splits(self.config.num_trials, &self.config.split)?;

        tracing::info!(
            "{}: {} rows, {} trials",
            data.descriptor().name(),
            data.num_rows(),
            self.config.num_trials
        );

        let runner = TrialRunner::new(data.descriptor(), self.registry);
        let algorithms = self
            .registry
            .algorithms()
            .iter()
            .map(|algorithm| {
                self.run_algorithm(&runner, algorithm.as_ref(), &full_splits, &numerical_splits)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DatasetReport {
            dataset: data.descriptor().name().to_string(),
            rows: data.num_rows(),
            train_rows: full_splits[0].train_rows.len(),
            test_rows: full_splits[0].test_rows.len(),
            algorithms,
        })
    }

    fn run_algorithm(
        &self,
        runner: &TrialRunner<'_>,
        algorithm: &dyn Algorithm,
        full_splits: &[Split],
        numerical_splits: &[Split],
    ) -> Result<AlgorithmReport> {
        tracing::info!("    Algorithm: {}", algorithm.name());
        self.progress.set_message(algorithm.name().to_string());

        let params = self
            .config
            .algorithm_params
            .get(algorithm.name())
            .cloned()
            .unwrap_or_default();

        let mut full_results = ResultsAccumulator::new();
        let mut numerical_results = ResultsAccumulator::new();
        let mut failures = Vec::new();

        for (full, numerical) in full_splits.iter().zip(numerical_splits) {
            if !algorithm.requires_numerical_only() {
                failures.extend(self.run_unit(runner, algorithm, full, &params, DataShape::Full, &mut full_results)?);
            }
            failures.extend(self.run_unit(
                runner,
                algorithm,
                numerical,
                &params,
                DataShape::Numerical,
                &mut numerical_results,
            )?);
            self.progress.inc(1);
        }

        Ok(AlgorithmReport {
            algorithm: algorithm.name().to_string(),
            description: algorithm.description().to_string(),
            numerical_only: algorithm.requires_numerical_only(),
            fairness_aware: algorithm.is_fairness_aware(),
            numerical: numerical_results.finalize()?,
            full: full_results.finalize()?,
            numerical_results,
            full_results,
            failures,
        })
    }

    /// Run one trial; with failure isolation a unit failure becomes a record
    fn run_unit(
        &self,
        runner: &TrialRunner<'_>,
        algorithm: &dyn Algorithm,
        split: &Split,
        params: &Params,
        shape: DataShape,
        accumulator: &mut ResultsAccumulator,
    ) -> Result<Option<TrialFailure>> {
        tracing::debug!("{} trial {} ({})", algorithm.name(), split.trial, shape);

        match runner.run_trial(algorithm, split, params, accumulator) {
            Ok(()) => Ok(None),
            Err(e) if self.config.isolate_failures && e.is_unit_failure() => {
                tracing::warn!("{} failed on trial {} ({}): {}", algorithm.name(), split.trial, shape, e);
                Ok(Some(TrialFailure {
                    shape,
                    trial: split.trial,
                    error: e.to_string(),
                }))
            }
            Err(e) => Err(e),
        }
    }

    /// Save results to JSON file
    pub fn save_results(results: &BenchmarkReport, output_path: &Path) -> Result<()> {
        std::fs::create_dir_all(output_path.parent().unwrap_or(Path::new(".")))?;
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(output_path, json)?;
        tracing::info!("Results saved to {}", output_path.display());
        Ok(())
    }

    /// Generate a markdown report
    pub fn generate_report(results: &BenchmarkReport) -> String {
        let mut report = String::new();

        report.push_str("# Fairness Benchmark Report\n\n");
        report.push_str(&format!("**Generated:** {}\n\n", results.timestamp.format("%Y-%m-%d %H:%M:%S UTC")));
        report.push_str(&format!("**Version:** {}\n\n", results.version));
        report.push_str(&format!(
            "**Trials:** {} (seed {}, train fraction {:.3})\n\n",
            results.config.num_trials, results.config.split.seed, results.config.split.train_fraction
        ));

        for dataset in &results.datasets {
            report.push_str(&format!("## {}\n\n", dataset.dataset));
            report.push_str(&format!(
                "- Rows: {} ({} train / {} test per trial)\n\n",
                dataset.rows, dataset.train_rows, dataset.test_rows
            ));

            for algorithm in &dataset.algorithms {
                report.push_str(&format!("### {}\n\n", algorithm.algorithm));
                report.push_str(&format!("*{}*\n\n", algorithm.description));
                if algorithm.fairness_aware {
                    report.push_str("Fairness-aware: fits with the sensitive attributes.\n\n");
                }

                let mut shapes = vec![(DataShape::Numerical, &algorithm.numerical)];
                if !algorithm.numerical_only {
                    shapes.push((DataShape::Full, &algorithm.full));
                }

                report.push_str("| Data | Metric | Mean | Stdev | Trials |\n");
                report.push_str("|------|--------|------|-------|--------|\n");
                for (shape, summaries) in shapes {
                    for summary in summaries {
                        let stdev = summary.stdev.map_or("-".to_string(), |v| format!("{:.4}", v));
                        report.push_str(&format!(
                            "| {} | {} | {:.4} | {} | {} |\n",
                            shape, summary.name, summary.mean, stdev, summary.samples
                        ));
                    }
                }
                report.push('\n');

                if !algorithm.failures.is_empty() {
                    report.push_str("Failed trials:\n\n");
                    for failure in &algorithm.failures {
                        report.push_str(&format!("- trial {} ({}): {}\n", failure.trial, failure.shape, failure.error));
                    }
                    report.push('\n');
                }
            }
        }

        report.push_str("## Configuration\n\n");
        report.push_str(&format!(
            "```json\n{}\n```\n",
            serde_json::to_string_pretty(&results.config).unwrap_or_default()
        ));

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::MajorityBaseline;
    use crate::datasets::{standard_datasets, DatasetDescriptor};
    use crate::metrics::{Accuracy, CaldersVerwer};

    fn synthetic_config(num_trials: usize) -> BenchmarkConfig {
        BenchmarkConfig {
            num_trials,
            dataset_names: vec!["synthetic".to_string()],
            ..BenchmarkConfig::default()
        }
    }

    #[test]
    fn test_pipeline_synthetic() {
        let registry = Registry::standard(42).unwrap();
        let pipeline = BenchmarkPipeline::new(synthetic_config(3), &registry);
        let report = pipeline.run().expect("Pipeline should succeed");

        assert_eq!(report.datasets.len(), 1);
        let dataset = &report.datasets[0];
        assert_eq!(dataset.algorithms.len(), registry.algorithms().len());

        let two_nb = dataset.algorithms.iter().find(|a| a.algorithm == "TwoNaiveBayes").unwrap();
        assert!(two_nb.fairness_aware);
        let majority = dataset.algorithms.iter().find(|a| a.algorithm == "Majority").unwrap();
        assert!(!majority.fairness_aware);

        for algorithm in &dataset.algorithms {
            assert_eq!(algorithm.numerical_results.trials(), 3);
            if algorithm.numerical_only {
                assert!(algorithm.full.is_empty());
            } else {
                assert_eq!(algorithm.full_results.trials(), 3);
            }
        }
    }

    #[test]
    fn test_invalid_trial_count_aborts() {
        let registry = Registry::standard(42).unwrap();
        let pipeline = BenchmarkPipeline::new(synthetic_config(0), &registry);
        assert!(matches!(pipeline.run(), Err(Error::InvalidTrialCount(0))));
    }

    #[test]
    fn test_unknown_dataset_skipped() {
        let registry = Registry::standard(42).unwrap();
        let config = BenchmarkConfig {
            num_trials: 2,
            dataset_names: vec!["no-such-dataset".to_string()],
            ..BenchmarkConfig::default()
        };

        let report = BenchmarkPipeline::new(config, &registry).run().unwrap();
        assert!(report.datasets.is_empty());
    }

    #[test]
    fn test_default_selects_all_datasets() {
        let registry = Registry::standard(42).unwrap();
        let pipeline = BenchmarkPipeline::new(BenchmarkConfig::default(), &registry);
        assert_eq!(pipeline.selected_datasets().len(), standard_datasets().len());
    }

    #[test]
    fn test_set_param() {
        let mut config = BenchmarkConfig::default();
        config.set_param("LogisticRegression.learning_rate=0.05").unwrap();

        assert_eq!(config.algorithm_params["LogisticRegression"]["learning_rate"], 0.05);
        assert!(config.set_param("LogisticRegression=0.1").is_err());
        assert!(config.set_param("LogisticRegression.epochs=many").is_err());
    }

    #[test]
    fn test_params_for_unknown_algorithm_rejected() {
        let registry = Registry::standard(42).unwrap();
        let mut config = synthetic_config(2);
        config.set_param("Perceptron.epochs=5").unwrap();

        let result = BenchmarkPipeline::new(config, &registry).run();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_trial_runner_keys_and_commit() {
        let descriptor = DatasetDescriptor::new("synthetic", "outcome", "1").with_sensitive("sex", &["male"]);
        let data = ProcessedData::synthetic(&descriptor, 60, 3).unwrap();
        let (full, _) = data.create_train_test_splits(1, &SplitConfig::default()).unwrap();

        let metrics: Vec<Box<dyn Metric>> = vec![Box::new(Accuracy)];
        let fairness: Vec<Box<dyn FairnessMetric>> = vec![Box::new(CaldersVerwer)];
        let runner = TrialRunner::with_metrics(&descriptor, &metrics, &fairness);

        let mut acc = ResultsAccumulator::new();
        runner
            .run_trial(&MajorityBaseline::new(), &full[0], &Params::new(), &mut acc)
            .unwrap();

        let names: Vec<_> = acc.names().collect();
        assert_eq!(names, vec!["accuracy", "CV-sex"]);
        // Majority predictions give every group the same positive rate
        assert!((acc.get("CV-sex").unwrap()[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_generate_report() {
        let registry = Registry::standard(42).unwrap();
        let report = BenchmarkPipeline::new(synthetic_config(2), &registry).run().unwrap();

        let markdown = BenchmarkPipeline::generate_report(&report);
        assert!(markdown.contains("# Fairness Benchmark Report"));
        assert!(markdown.contains("## synthetic"));
        assert!(markdown.contains("Fairness-aware"));
        assert!(markdown.contains("accuracy"));

        let text = report.format();
        assert!(text.contains("Evaluating dataset: synthetic"));
        assert!(text.contains("average accuracy"));
        assert!(text.contains("stdev DIbinary-sex"));
    }

    #[test]
    fn test_save_results() {
        let registry = Registry::standard(42).unwrap();
        let report = BenchmarkPipeline::new(synthetic_config(2), &registry).run().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("benchmark.json");
        BenchmarkPipeline::save_results(&report, &path).unwrap();

        let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["config"]["num_trials"], 2);
        assert_eq!(saved["datasets"][0]["dataset"], "synthetic");
    }
}
