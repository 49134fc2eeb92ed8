// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Classification algorithms plugged into the benchmark
//!
//! Implements:
//! - Majority class baseline (always predict most common class)
//! - Stratified baseline (predict proportional to class distribution)
//! - Naive Bayes (categorical + Gaussian features, fairness-unaware)
//! - Two Naive Bayes (one model per sensitive group, fairness-aware)
//! - Logistic regression (numerical features only)
//!
//! Train and test tables still carry the sensitive attribute columns.
//! Fairness-unaware algorithms drop them, together with the class column,
//! before fitting.

use crate::error::{Error, Result};
use crate::table::{Column, Table, Value};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Algorithm-specific hyperparameters
pub type Params = BTreeMap<String, f64>;

/// Trait for all benchmarked algorithms
pub trait Algorithm: Send + Sync {
    /// Get algorithm name; unique within a registry
    fn name(&self) -> &str;

    /// Get algorithm description
    fn description(&self) -> &str;

    /// Whether the algorithm can only consume numerically encoded data
    fn requires_numerical_only(&self) -> bool {
        false
    }

    /// Whether the algorithm uses the sensitive attributes on purpose
    fn is_fairness_aware(&self) -> bool {
        false
    }

    /// Fit on `train` and predict one label per row of `test`, in row order.
    ///
    /// Must not keep state between calls.
    fn run(
        &self,
        train: &Table,
        test: &Table,
        class_attribute: &str,
        sensitive_attributes: &[String],
        params: &Params,
    ) -> Result<Vec<Value>>;
}

fn excluded_columns<'a>(class_attribute: &'a str, sensitive_attributes: &'a [String]) -> Vec<&'a str> {
    std::iter::once(class_attribute)
        .chain(sensitive_attributes.iter().map(String::as_str))
        .collect()
}

fn check_params(algorithm: &str, params: &Params, allowed: &[&str]) -> Result<()> {
    for (key, value) in params {
        if !allowed.contains(&key.as_str()) {
            return Err(Error::algorithm(algorithm, format!("unknown parameter '{}'", key)));
        }
        if !value.is_finite() {
            return Err(Error::algorithm(algorithm, format!("parameter '{}' is not finite", key)));
        }
    }
    Ok(())
}

fn param(params: &Params, key: &str, default: f64) -> f64 {
    params.get(key).copied().unwrap_or(default)
}

/// Distinct labels with their counts, in first-seen order
#[derive(Debug, Clone, Default)]
struct LabelCounts {
    labels: Vec<Value>,
    counts: Vec<usize>,
}

impl LabelCounts {
    fn from_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut counts = Self::default();
        for value in values {
            match counts.labels.iter().position(|l| l == value) {
                Some(idx) => counts.counts[idx] += 1,
                None => {
                    counts.labels.push(value.clone());
                    counts.counts.push(1);
                }
            }
        }
        counts
    }

    fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Most common label; ties go to the label seen first
    fn majority(&self) -> Option<&Value> {
        let mut best: Option<(usize, usize)> = None;
        for (idx, &count) in self.counts.iter().enumerate() {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((idx, count));
            }
        }
        best.map(|(idx, _)| &self.labels[idx])
    }
}

/// Majority class baseline: always predicts the most common training class
#[derive(Debug, Clone, Default)]
pub struct MajorityBaseline;

impl MajorityBaseline {
    pub fn new() -> Self {
        Self
    }
}

impl Algorithm for MajorityBaseline {
    fn name(&self) -> &str {
        "Majority"
    }

    fn description(&self) -> &str {
        "Always predicts the majority class from training data"
    }

    fn run(
        &self,
        train: &Table,
        test: &Table,
        class_attribute: &str,
        _sensitive_attributes: &[String],
        params: &Params,
    ) -> Result<Vec<Value>> {
        check_params(self.name(), params, &[])?;

        let counts = LabelCounts::from_values(train.require_column(class_attribute)?);
        let majority = counts
            .majority()
            .cloned()
            .ok_or_else(|| Error::algorithm(self.name(), "training set is empty"))?;

        Ok(vec![majority; test.num_rows()])
    }
}

/// Stratified baseline: predicts proportionally to the training class distribution
#[derive(Debug, Clone)]
pub struct StratifiedBaseline {
    seed: u64,
}

impl StratifiedBaseline {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Algorithm for StratifiedBaseline {
    fn name(&self) -> &str {
        "Stratified"
    }

    fn description(&self) -> &str {
        "Random predictions following the training class distribution"
    }

    fn run(
        &self,
        train: &Table,
        test: &Table,
        class_attribute: &str,
        _sensitive_attributes: &[String],
        params: &Params,
    ) -> Result<Vec<Value>> {
        check_params(self.name(), params, &[])?;

        let counts = LabelCounts::from_values(train.require_column(class_attribute)?);
        let total = counts.total();
        if total == 0 {
            return Err(Error::algorithm(self.name(), "training set is empty"));
        }

        // Fresh RNG per call keeps the algorithm stateless
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let predictions = (0..test.num_rows())
            .map(|_| {
                let mut draw = rng.gen_range(0..total);
                let mut chosen = &counts.labels[0];
                for (label, &count) in counts.labels.iter().zip(&counts.counts) {
                    if draw < count {
                        chosen = label;
                        break;
                    }
                    draw -= count;
                }
                chosen.clone()
            })
            .collect();

        Ok(predictions)
    }
}

const MIN_VARIANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
enum FeatureModel {
    /// Per-class (mean, variance)
    Gaussian { stats: Vec<(f64, f64)> },
    /// Per-class category counts and the number of distinct categories
    Categorical {
        counts: Vec<HashMap<String, usize>>,
        categories: usize,
    },
}

impl FeatureModel {
    fn log_likelihood(&self, class: usize, class_count: usize, value: &Value, alpha: f64) -> f64 {
        match self {
            FeatureModel::Gaussian { stats } => match value.as_f64() {
                Some(x) => {
                    let (mean, var) = stats[class];
                    -0.5 * (2.0 * std::f64::consts::PI * var).ln() - (x - mean).powi(2) / (2.0 * var)
                }
                None => 0.0,
            },
            FeatureModel::Categorical { counts, categories } => {
                let seen = counts[class].get(&value.key()).copied().unwrap_or(0);
                // One extra slot for categories never seen in training
                ((seen as f64 + alpha) / (class_count as f64 + alpha * (*categories + 1) as f64)).ln()
            }
        }
    }
}

/// Naive Bayes fitted on a subset of training rows
#[derive(Debug, Clone)]
struct NaiveBayesModel {
    classes: LabelCounts,
    features: Vec<(String, FeatureModel)>,
    alpha: f64,
}

impl NaiveBayesModel {
    /// Returns `None` when `rows` is empty
    fn fit(labels: &[Value], features: &[&Column], rows: &[usize], alpha: f64) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }

        let classes = LabelCounts::from_values(rows.iter().map(|&r| &labels[r]));
        let class_of = |row: usize| {
            classes
                .labels
                .iter()
                .position(|l| *l == labels[row])
                .unwrap_or(0)
        };
        let row_classes: Vec<usize> = rows.iter().map(|&r| class_of(r)).collect();

        let features = features
            .iter()
            .map(|column| {
                let numeric = rows.iter().all(|&r| column.values[r].is_numeric());
                let model = if numeric {
                    let stats = (0..classes.labels.len())
                        .map(|k| {
                            let xs: Vec<f64> = rows
                                .iter()
                                .zip(&row_classes)
                                .filter(|(_, &c)| c == k)
                                .filter_map(|(&r, _)| column.values[r].as_f64())
                                .collect();
                            let n = xs.len().max(1) as f64;
                            let mean = xs.iter().sum::<f64>() / n;
                            let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
                            (mean, var.max(MIN_VARIANCE))
                        })
                        .collect();
                    FeatureModel::Gaussian { stats }
                } else {
                    let mut counts = vec![HashMap::new(); classes.labels.len()];
                    let mut distinct = HashSet::new();
                    for (&r, &k) in rows.iter().zip(&row_classes) {
                        let key = column.values[r].key();
                        *counts[k].entry(key.clone()).or_insert(0) += 1;
                        distinct.insert(key);
                    }
                    FeatureModel::Categorical {
                        counts,
                        categories: distinct.len(),
                    }
                };
                (column.name.clone(), model)
            })
            .collect();

        Some(Self {
            classes,
            features,
            alpha,
        })
    }

    /// Resolve the model's feature columns in `table`
    fn bind<'t>(&self, table: &'t Table) -> Result<Vec<&'t [Value]>> {
        self.features
            .iter()
            .map(|(name, _)| table.require_column(name))
            .collect()
    }

    fn predict_row(&self, bound: &[&[Value]], row: usize) -> &Value {
        let total = self.classes.total() as f64;
        let mut best: Option<(usize, f64)> = None;

        for (k, &count) in self.classes.counts.iter().enumerate() {
            let mut score = (count as f64 / total).ln();
            for ((_, feature), column) in self.features.iter().zip(bound) {
                score += feature.log_likelihood(k, count, &column[row], self.alpha);
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((k, score));
            }
        }

        &self.classes.labels[best.map_or(0, |(k, _)| k)]
    }
}

fn smoothing(algorithm: &str, params: &Params) -> Result<f64> {
    check_params(algorithm, params, &["alpha"])?;
    let alpha = param(params, "alpha", 1.0);
    if alpha <= 0.0 {
        return Err(Error::algorithm(algorithm, "alpha must be positive"));
    }
    Ok(alpha)
}

/// Naive Bayes over all non-sensitive features
#[derive(Debug, Clone, Default)]
pub struct NaiveBayes;

impl Algorithm for NaiveBayes {
    fn name(&self) -> &str {
        "NaiveBayes"
    }

    fn description(&self) -> &str {
        "Naive Bayes with Gaussian numeric and Laplace-smoothed categorical features"
    }

    fn run(
        &self,
        train: &Table,
        test: &Table,
        class_attribute: &str,
        sensitive_attributes: &[String],
        params: &Params,
    ) -> Result<Vec<Value>> {
        let alpha = smoothing(self.name(), params)?;
        let excluded = excluded_columns(class_attribute, sensitive_attributes);
        let labels = train.require_column(class_attribute)?;
        let features = train.feature_columns(&excluded);
        let rows: Vec<usize> = (0..train.num_rows()).collect();

        let model = NaiveBayesModel::fit(labels, &features, &rows, alpha)
            .ok_or_else(|| Error::algorithm(self.name(), "training set is empty"))?;
        let bound = model.bind(test)?;

        Ok((0..test.num_rows())
            .map(|row| model.predict_row(&bound, row).clone())
            .collect())
    }
}

/// Two Naive Bayes: a separate model for every sensitive group
///
/// Each test row is classified by the model of its own group, so group-level
/// differences in the data are modelled explicitly instead of through a
/// shared set of parameters. Groups unseen during training fall back to a
/// model fitted on all rows.
#[derive(Debug, Clone, Default)]
pub struct TwoNaiveBayes;

impl TwoNaiveBayes {
    fn group_key(columns: &[&[Value]], row: usize) -> String {
        columns
            .iter()
            .map(|c| c[row].key())
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl Algorithm for TwoNaiveBayes {
    fn name(&self) -> &str {
        "TwoNaiveBayes"
    }

    fn description(&self) -> &str {
        "One Naive Bayes model per sensitive group"
    }

    fn is_fairness_aware(&self) -> bool {
        true
    }

    fn run(
        &self,
        train: &Table,
        test: &Table,
        class_attribute: &str,
        sensitive_attributes: &[String],
        params: &Params,
    ) -> Result<Vec<Value>> {
        let alpha = smoothing(self.name(), params)?;
        if sensitive_attributes.is_empty() {
            return Err(Error::algorithm(self.name(), "needs at least one sensitive attribute"));
        }

        let excluded = excluded_columns(class_attribute, sensitive_attributes);
        let labels = train.require_column(class_attribute)?;
        let features = train.feature_columns(&excluded);

        let train_groups: Vec<&[Value]> = sensitive_attributes
            .iter()
            .map(|a| train.require_column(a))
            .collect::<Result<_>>()?;
        let test_groups: Vec<&[Value]> = sensitive_attributes
            .iter()
            .map(|a| test.require_column(a))
            .collect::<Result<_>>()?;

        let mut group_rows: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for row in 0..train.num_rows() {
            group_rows
                .entry(Self::group_key(&train_groups, row))
                .or_default()
                .push(row);
        }

        let all_rows: Vec<usize> = (0..train.num_rows()).collect();
        let fallback = NaiveBayesModel::fit(labels, &features, &all_rows, alpha)
            .ok_or_else(|| Error::algorithm(self.name(), "training set is empty"))?;

        let mut models = HashMap::new();
        for (key, rows) in &group_rows {
            if let Some(model) = NaiveBayesModel::fit(labels, &features, rows, alpha) {
                models.insert(key.clone(), model);
            }
        }
        tracing::debug!("{}: fitted {} group models", self.name(), models.len());

        let bound = fallback.bind(test)?;
        Ok((0..test.num_rows())
            .map(|row| {
                let key = Self::group_key(&test_groups, row);
                let model = models.get(&key).unwrap_or(&fallback);
                model.predict_row(&bound, row).clone()
            })
            .collect())
    }
}

/// Logistic regression trained with batch gradient descent
///
/// Parameters: `learning_rate` (default 0.1), `epochs` (default 200),
/// `l2` (default 0.0).
#[derive(Debug, Clone, Default)]
pub struct LogisticRegression;

impl LogisticRegression {
    fn numeric_rows(&self, columns: &[&[Value]], num_rows: usize) -> Result<Vec<Vec<f64>>> {
        (0..num_rows)
            .map(|row| {
                columns
                    .iter()
                    .map(|c| {
                        c[row].as_f64().ok_or_else(|| {
                            Error::algorithm(self.name(), format!("non-numeric feature value '{}'", c[row]))
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

/// Logistic function; never evaluates `exp` of a large positive argument
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let ez = z.exp();
        ez / (1.0 + ez)
    }
}

impl Algorithm for LogisticRegression {
    fn name(&self) -> &str {
        "LogisticRegression"
    }

    fn description(&self) -> &str {
        "L2-regularised logistic regression on standardised numeric features"
    }

    fn requires_numerical_only(&self) -> bool {
        true
    }

    fn run(
        &self,
        train: &Table,
        test: &Table,
        class_attribute: &str,
        sensitive_attributes: &[String],
        params: &Params,
    ) -> Result<Vec<Value>> {
        check_params(self.name(), params, &["learning_rate", "epochs", "l2"])?;
        let learning_rate = param(params, "learning_rate", 0.1);
        let epochs = param(params, "epochs", 200.0);
        let l2 = param(params, "l2", 0.0);
        if learning_rate <= 0.0 {
            return Err(Error::algorithm(self.name(), "learning_rate must be positive"));
        }
        if epochs < 1.0 || epochs.fract() != 0.0 {
            return Err(Error::algorithm(self.name(), "epochs must be a positive integer"));
        }
        if l2 < 0.0 {
            return Err(Error::algorithm(self.name(), "l2 must not be negative"));
        }

        let labels = train.require_column(class_attribute)?;
        let classes = LabelCounts::from_values(labels);
        match classes.labels.len() {
            0 => return Err(Error::algorithm(self.name(), "training set is empty")),
            1 => return Ok(vec![classes.labels[0].clone(); test.num_rows()]),
            2 => {}
            n => {
                return Err(Error::algorithm(
                    self.name(),
                    format!("binary classification only, found {} classes", n),
                ))
            }
        }

        let excluded = excluded_columns(class_attribute, sensitive_attributes);
        let feature_names: Vec<String> = train
            .feature_columns(&excluded)
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let train_columns: Vec<&[Value]> = feature_names
            .iter()
            .map(|n| train.require_column(n))
            .collect::<Result<_>>()?;
        let test_columns: Vec<&[Value]> = feature_names
            .iter()
            .map(|n| test.require_column(n))
            .collect::<Result<_>>()?;

        let mut x_train = self.numeric_rows(&train_columns, train.num_rows())?;
        let mut x_test = self.numeric_rows(&test_columns, test.num_rows())?;
        let y: Vec<f64> = labels
            .iter()
            .map(|l| if *l == classes.labels[1] { 1.0 } else { 0.0 })
            .collect();

        // Standardise with training statistics
        let n = x_train.len() as f64;
        let dims = feature_names.len();
        for j in 0..dims {
            let mean = x_train.iter().map(|r| r[j]).sum::<f64>() / n;
            let std = (x_train.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n).sqrt();
            let scale = if std > 0.0 { std } else { 1.0 };
            for row in x_train.iter_mut().chain(x_test.iter_mut()) {
                row[j] = (row[j] - mean) / scale;
            }
        }

        let mut weights = vec![0.0; dims];
        let mut bias = 0.0;
        for _ in 0..epochs as usize {
            let mut grad_w = vec![0.0; dims];
            let mut grad_b = 0.0;
            for (row, target) in x_train.iter().zip(&y) {
                let z: f64 = row.iter().zip(&weights).map(|(x, w)| x * w).sum::<f64>() + bias;
                let err = sigmoid(z) - target;
                for (g, x) in grad_w.iter_mut().zip(row) {
                    *g += err * x;
                }
                grad_b += err;
            }
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= learning_rate * (g / n + l2 * *w);
            }
            bias -= learning_rate * grad_b / n;
        }

        if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::algorithm(self.name(), "gradient descent did not converge"));
        }

        Ok(x_test
            .iter()
            .map(|row| {
                let z: f64 = row.iter().zip(&weights).map(|(x, w)| x * w).sum::<f64>() + bias;
                let idx = if sigmoid(z) >= 0.5 { 1 } else { 0 };
                classes.labels[idx].clone()
            })
            .collect())
    }
}

/// Factory function to create all registered algorithms
pub fn standard_algorithms(seed: u64) -> Vec<Box<dyn Algorithm>> {
    vec![
        Box::new(MajorityBaseline::new()),
        Box::new(StratifiedBaseline::new(seed)),
        Box::new(NaiveBayes),
        Box::new(TwoNaiveBayes),
        Box::new(LogisticRegression),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_train_table() -> Table {
        Table::new(vec![
            Column::parsed("hours", &["10", "12", "45", "50", "11", "48", "52", "9"]),
            Column::parsed("job", &["clerk", "clerk", "exec", "exec", "clerk", "exec", "exec", "clerk"]),
            Column::parsed("sex", &["f", "f", "m", "m", "m", "f", "m", "f"]),
            Column::parsed("label", &["0", "0", "1", "1", "0", "1", "1", "0"]),
        ])
        .unwrap()
    }

    fn create_test_table() -> Table {
        Table::new(vec![
            Column::parsed("hours", &["8", "55", "47"]),
            Column::parsed("job", &["clerk", "exec", "exec"]),
            Column::parsed("sex", &["m", "f", "m"]),
            Column::parsed("label", &["0", "1", "1"]),
        ])
        .unwrap()
    }

    fn sensitive() -> Vec<String> {
        vec!["sex".to_string()]
    }

    #[test]
    fn test_majority_baseline() {
        let train = Table::new(vec![
            Column::parsed("sex", &["f", "m", "m"]),
            Column::parsed("label", &["1", "0", "0"]),
        ])
        .unwrap();
        let test = train.select_rows(&[0, 1]);

        let predictions = MajorityBaseline::new()
            .run(&train, &test, "label", &sensitive(), &Params::new())
            .unwrap();
        assert_eq!(predictions, vec![Value::Num(0.0), Value::Num(0.0)]);
    }

    #[test]
    fn test_majority_baseline_empty_train() {
        let train = create_train_table().select_rows(&[]);
        let result = MajorityBaseline::new().run(&train, &create_test_table(), "label", &sensitive(), &Params::new());
        assert!(matches!(result, Err(Error::AlgorithmRunFailure { .. })));
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let mut params = Params::new();
        params.insert("depth".to_string(), 3.0);

        let result = MajorityBaseline::new().run(
            &create_train_table(),
            &create_test_table(),
            "label",
            &sensitive(),
            &params,
        );
        assert!(matches!(result, Err(Error::AlgorithmRunFailure { .. })));
    }

    #[test]
    fn test_stratified_baseline() {
        let train = create_train_table();
        let test = create_test_table();
        let baseline = StratifiedBaseline::new(42);

        let first = baseline.run(&train, &test, "label", &sensitive(), &Params::new()).unwrap();
        let second = baseline.run(&train, &test, "label", &sensitive(), &Params::new()).unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        for label in &first {
            assert!(*label == Value::Num(0.0) || *label == Value::Num(1.0));
        }
    }

    #[test]
    fn test_naive_bayes() {
        let predictions = NaiveBayes
            .run(&create_train_table(), &create_test_table(), "label", &sensitive(), &Params::new())
            .unwrap();
        assert_eq!(predictions, vec![Value::Num(0.0), Value::Num(1.0), Value::Num(1.0)]);
    }

    #[test]
    fn test_naive_bayes_ignores_sensitive_attribute() {
        let train = create_train_table();
        let test = create_test_table();

        // Flipping the sensitive column must not change predictions
        let flipped = Table::new(
            test.columns()
                .iter()
                .map(|c| {
                    if c.name == "sex" {
                        Column::parsed("sex", &["f", "m", "f"])
                    } else {
                        c.clone()
                    }
                })
                .collect(),
        )
        .unwrap();

        let a = NaiveBayes.run(&train, &test, "label", &sensitive(), &Params::new()).unwrap();
        let b = NaiveBayes.run(&train, &flipped, "label", &sensitive(), &Params::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_two_naive_bayes() {
        let algorithm = TwoNaiveBayes;
        assert!(algorithm.is_fairness_aware());

        let predictions = algorithm
            .run(&create_train_table(), &create_test_table(), "label", &sensitive(), &Params::new())
            .unwrap();
        assert_eq!(predictions.len(), 3);

        let result = algorithm.run(&create_train_table(), &create_test_table(), "label", &[], &Params::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_logistic_regression() {
        let train = create_train_table().to_numerical(&["sex", "label"]);
        let test = create_test_table().to_numerical(&["sex", "label"]);

        let algorithm = LogisticRegression;
        assert!(algorithm.requires_numerical_only());

        let predictions = algorithm.run(&train, &test, "label", &sensitive(), &Params::new()).unwrap();
        assert_eq!(predictions, vec![Value::Num(0.0), Value::Num(1.0), Value::Num(1.0)]);
    }

    #[test]
    fn test_logistic_regression_rejects_categorical_features() {
        let result = LogisticRegression.run(
            &create_train_table(),
            &create_test_table(),
            "label",
            &sensitive(),
            &Params::new(),
        );
        assert!(matches!(result, Err(Error::AlgorithmRunFailure { .. })));
    }

    #[test]
    fn test_logistic_regression_invalid_params() {
        let train = create_train_table().to_numerical(&["sex", "label"]);
        let test = create_test_table().to_numerical(&["sex", "label"]);
        let mut params = Params::new();
        params.insert("learning_rate".to_string(), -1.0);

        let result = LogisticRegression.run(&train, &test, "label", &sensitive(), &params);
        assert!(matches!(result, Err(Error::AlgorithmRunFailure { .. })));
    }

    #[test]
    fn test_all_algorithms() {
        let algorithms = standard_algorithms(42);
        assert_eq!(algorithms.len(), 5);

        let names: Vec<_> = algorithms.iter().map(|a| a.name()).collect();
        assert!(names.contains(&"Majority"));
        assert!(names.contains(&"Stratified"));
        assert!(names.contains(&"NaiveBayes"));
        assert!(names.contains(&"TwoNaiveBayes"));
        assert!(names.contains(&"LogisticRegression"));
    }

    #[test]
    fn test_sigmoid_extremes() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!((sigmoid(3.0) + sigmoid(-3.0) - 1.0).abs() < 1e-12);

        let tiny = sigmoid(-745.0);
        assert!(tiny.is_finite() && tiny >= 0.0);
        assert!((sigmoid(-30.0) - (-30.0f64).exp()).abs() < 1e-20);
        assert_eq!(sigmoid(800.0), 1.0);
    }
}
