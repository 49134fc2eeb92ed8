// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Accuracy and fairness metrics
//!
//! Plain metrics score `(actual, predicted)`. Fairness metrics also receive the
//! per-row sensitive attribute values, the privileged values of that attribute
//! and the positive class value.
//!
//! Implements:
//! - Accuracy, Balanced Accuracy
//! - Disparate Impact (`DIbinary`)
//! - Calders-Verwer score (`CV`)
//! - True positive rate difference (`TPRDiff`)

use crate::error::{Error, Result};
use crate::table::Value;
use serde::{Deserialize, Serialize};

/// A metric computed from actual and predicted labels only
pub trait Metric: Send + Sync {
    /// Name used as the results key; unique within a run
    fn name(&self) -> &str;

    /// Score one trial. Must be deterministic for identical inputs.
    fn calc(&self, actual: &[Value], predicted: &[Value]) -> Result<f64>;
}

/// A metric that needs sensitive attribute context
pub trait FairnessMetric: Send + Sync {
    /// Name used as the results key prefix; unique within a run
    fn name(&self) -> &str;

    fn calc(
        &self,
        actual: &[Value],
        predicted: &[Value],
        sensitive: &[Value],
        privileged: &[Value],
        positive: &Value,
    ) -> Result<f64>;
}

fn check_lengths(metric: &str, actual: &[Value], others: &[(&str, usize)]) -> Result<()> {
    if actual.is_empty() {
        return Err(Error::metric(metric, "no labels to score"));
    }
    for (what, len) in others {
        if *len != actual.len() {
            return Err(Error::metric(
                metric,
                format!("{} has {} entries but actual has {}", what, len, actual.len()),
            ));
        }
    }
    Ok(())
}

/// Confusion matrix for binary classification relative to a positive value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// True Positives
    pub tp: usize,
    /// True Negatives
    pub tn: usize,
    /// False Positives
    pub fp: usize,
    /// False Negatives
    pub fn_: usize,
}

impl ConfusionMatrix {
    /// Create from labels; anything not equal to `positive` counts as negative
    pub fn from_labels(actual: &[Value], predicted: &[Value], positive: &Value) -> Self {
        let mut matrix = Self::default();
        for (truth, pred) in actual.iter().zip(predicted.iter()) {
            matrix.record(truth == positive, pred == positive);
        }
        matrix
    }

    fn record(&mut self, actual_positive: bool, predicted_positive: bool) {
        match (actual_positive, predicted_positive) {
            (true, true) => self.tp += 1,
            (false, false) => self.tn += 1,
            (false, true) => self.fp += 1,
            (true, false) => self.fn_ += 1,
        }
    }

    /// Total number of samples
    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// True positive rate: TP / (TP + FN)
    pub fn true_positive_rate(&self) -> Option<f64> {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// Fraction of rows predicted positive: (TP + FP) / Total
    pub fn positive_rate(&self) -> Option<f64> {
        ratio(self.tp + self.fp, self.total())
    }
}

fn ratio(num: usize, denom: usize) -> Option<f64> {
    if denom == 0 {
        None
    } else {
        Some(num as f64 / denom as f64)
    }
}

/// Confusion matrices of the privileged and unprivileged groups
#[derive(Debug, Clone, Default)]
pub struct GroupConfusion {
    pub privileged: ConfusionMatrix,
    pub unprivileged: ConfusionMatrix,
}

impl GroupConfusion {
    pub fn from_labels(
        actual: &[Value],
        predicted: &[Value],
        sensitive: &[Value],
        privileged: &[Value],
        positive: &Value,
    ) -> Self {
        let mut groups = Self::default();
        for ((truth, pred), group) in actual.iter().zip(predicted).zip(sensitive) {
            let matrix = if privileged.contains(group) {
                &mut groups.privileged
            } else {
                &mut groups.unprivileged
            };
            matrix.record(truth == positive, pred == positive);
        }
        groups
    }
}

fn group_confusion(
    metric: &str,
    actual: &[Value],
    predicted: &[Value],
    sensitive: &[Value],
    privileged: &[Value],
    positive: &Value,
) -> Result<GroupConfusion> {
    check_lengths(
        metric,
        actual,
        &[("predicted", predicted.len()), ("sensitive", sensitive.len())],
    )?;
    if privileged.is_empty() {
        return Err(Error::metric(metric, "no privileged values configured"));
    }

    let groups = GroupConfusion::from_labels(actual, predicted, sensitive, privileged, positive);
    if groups.privileged.total() == 0 {
        return Err(Error::metric(metric, "privileged group is empty"));
    }
    if groups.unprivileged.total() == 0 {
        return Err(Error::metric(metric, "unprivileged group is empty"));
    }
    Ok(groups)
}

/// Fraction of exactly matching predictions
#[derive(Debug, Clone, Default)]
pub struct Accuracy;

impl Metric for Accuracy {
    fn name(&self) -> &str {
        "accuracy"
    }

    fn calc(&self, actual: &[Value], predicted: &[Value]) -> Result<f64> {
        check_lengths(self.name(), actual, &[("predicted", predicted.len())])?;
        let correct = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();
        Ok(correct as f64 / actual.len() as f64)
    }
}

/// Recall averaged over every class present in the actual labels
#[derive(Debug, Clone, Default)]
pub struct BalancedAccuracy;

impl Metric for BalancedAccuracy {
    fn name(&self) -> &str {
        "balanced_accuracy"
    }

    fn calc(&self, actual: &[Value], predicted: &[Value]) -> Result<f64> {
        check_lengths(self.name(), actual, &[("predicted", predicted.len())])?;

        let mut classes: Vec<&Value> = Vec::new();
        for label in actual {
            if !classes.contains(&label) {
                classes.push(label);
            }
        }

        let recall_sum: f64 = classes
            .iter()
            .map(|class| {
                let matrix = ConfusionMatrix::from_labels(actual, predicted, class);
                matrix.true_positive_rate().unwrap_or(0.0)
            })
            .sum();

        Ok(recall_sum / classes.len() as f64)
    }
}

/// Disparate impact: P(pred = + | unprivileged) / P(pred = + | privileged)
///
/// 1.0 means parity; the four-fifths rule flags values below 0.8. Two groups
/// with no positive predictions at all count as parity.
#[derive(Debug, Clone, Default)]
pub struct DisparateImpact;

impl FairnessMetric for DisparateImpact {
    fn name(&self) -> &str {
        "DIbinary"
    }

    fn calc(
        &self,
        actual: &[Value],
        predicted: &[Value],
        sensitive: &[Value],
        privileged: &[Value],
        positive: &Value,
    ) -> Result<f64> {
        let groups = group_confusion(self.name(), actual, predicted, sensitive, privileged, positive)?;

        let privileged_rate = groups.privileged.positive_rate().unwrap_or(0.0);
        let unprivileged_rate = groups.unprivileged.positive_rate().unwrap_or(0.0);

        if privileged_rate == 0.0 {
            if unprivileged_rate == 0.0 {
                return Ok(1.0);
            }
            return Err(Error::metric(
                self.name(),
                "privileged group has no positive predictions",
            ));
        }
        Ok(unprivileged_rate / privileged_rate)
    }
}

/// Calders-Verwer score: 1 - (P(pred = + | privileged) - P(pred = + | unprivileged))
///
/// 1.0 means parity.
#[derive(Debug, Clone, Default)]
pub struct CaldersVerwer;

impl FairnessMetric for CaldersVerwer {
    fn name(&self) -> &str {
        "CV"
    }

    fn calc(
        &self,
        actual: &[Value],
        predicted: &[Value],
        sensitive: &[Value],
        privileged: &[Value],
        positive: &Value,
    ) -> Result<f64> {
        let groups = group_confusion(self.name(), actual, predicted, sensitive, privileged, positive)?;

        let privileged_rate = groups.privileged.positive_rate().unwrap_or(0.0);
        let unprivileged_rate = groups.unprivileged.positive_rate().unwrap_or(0.0);
        Ok(1.0 - (privileged_rate - unprivileged_rate))
    }
}

/// TPR(unprivileged) - TPR(privileged); 0.0 means equal opportunity
#[derive(Debug, Clone, Default)]
pub struct TprDifference;

impl FairnessMetric for TprDifference {
    fn name(&self) -> &str {
        "TPRDiff"
    }

    fn calc(
        &self,
        actual: &[Value],
        predicted: &[Value],
        sensitive: &[Value],
        privileged: &[Value],
        positive: &Value,
    ) -> Result<f64> {
        let groups = group_confusion(self.name(), actual, predicted, sensitive, privileged, positive)?;

        let privileged_tpr = groups.privileged.true_positive_rate().ok_or_else(|| {
            Error::metric(self.name(), "privileged group has no actual positives")
        })?;
        let unprivileged_tpr = groups.unprivileged.true_positive_rate().ok_or_else(|| {
            Error::metric(self.name(), "unprivileged group has no actual positives")
        })?;
        Ok(unprivileged_tpr - privileged_tpr)
    }
}

/// Plain metrics evaluated on every trial
pub fn standard_metrics() -> Vec<Box<dyn Metric>> {
    vec![Box::new(Accuracy), Box::new(BalancedAccuracy)]
}

/// Fairness metrics evaluated on every trial, per sensitive attribute
pub fn standard_fairness_metrics() -> Vec<Box<dyn FairnessMetric>> {
    vec![
        Box::new(DisparateImpact),
        Box::new(CaldersVerwer),
        Box::new(TprDifference),
    ]
}
