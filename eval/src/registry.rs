// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Registries of datasets, algorithms and metrics used by one benchmark run

use crate::algorithms::{standard_algorithms, Algorithm};
use crate::datasets::{standard_datasets, DatasetDescriptor};
use crate::error::{Error, Result};
use crate::metrics::{standard_fairness_metrics, standard_metrics, FairnessMetric, Metric};
use std::collections::HashSet;

/// Results key of a fairness metric evaluated on one sensitive attribute
pub fn fairness_metric_key(metric: &str, attribute: &str) -> String {
    format!("{}-{}", metric, attribute)
}

/// Ordered collections of pluggable units, built once per process
pub struct Registry {
    datasets: Vec<DatasetDescriptor>,
    algorithms: Vec<Box<dyn Algorithm>>,
    metrics: Vec<Box<dyn Metric>>,
    fairness_metrics: Vec<Box<dyn FairnessMetric>>,
}

impl Registry {
    /// Build a registry, rejecting duplicate names.
    ///
    /// Metric names must stay unique within one accumulator, which covers
    /// plain metric names and every `<fairness metric>-<attribute>` key any
    /// registered dataset can produce.
    pub fn new(
        datasets: Vec<DatasetDescriptor>,
        algorithms: Vec<Box<dyn Algorithm>>,
        metrics: Vec<Box<dyn Metric>>,
        fairness_metrics: Vec<Box<dyn FairnessMetric>>,
    ) -> Result<Self> {
        ensure_unique("dataset", datasets.iter().map(|d| d.name().to_string()))?;
        ensure_unique("algorithm", algorithms.iter().map(|a| a.name().to_string()))?;
        ensure_unique(
            "metric",
            metrics
                .iter()
                .map(|m| m.name().to_string())
                .chain(fairness_metrics.iter().map(|m| m.name().to_string())),
        )?;

        for dataset in &datasets {
            let keys = metrics.iter().map(|m| m.name().to_string()).chain(
                fairness_metrics.iter().flat_map(|m| {
                    dataset
                        .sensitive_attributes()
                        .iter()
                        .map(move |a| fairness_metric_key(m.name(), a))
                }),
            );
            ensure_unique("metric key", keys)?;
        }

        Ok(Self {
            datasets,
            algorithms,
            metrics,
            fairness_metrics,
        })
    }

    /// Registry with every built-in dataset, algorithm and metric
    pub fn standard(seed: u64) -> Result<Self> {
        Self::new(
            standard_datasets(),
            standard_algorithms(seed),
            standard_metrics(),
            standard_fairness_metrics(),
        )
    }

    pub fn datasets(&self) -> &[DatasetDescriptor] {
        &self.datasets
    }

    pub fn dataset_names(&self) -> Vec<&str> {
        self.datasets.iter().map(|d| d.name()).collect()
    }

    pub fn algorithms(&self) -> &[Box<dyn Algorithm>] {
        &self.algorithms
    }

    pub fn metrics(&self) -> &[Box<dyn Metric>] {
        &self.metrics
    }

    pub fn fairness_metrics(&self) -> &[Box<dyn FairnessMetric>] {
        &self.fairness_metrics
    }
}

fn ensure_unique(kind: &str, names: impl Iterator<Item = String>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.clone()) {
            return Err(Error::DuplicateName(format!("{} '{}'", kind, name)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::MajorityBaseline;
    use crate::metrics::{Accuracy, DisparateImpact};
    use crate::table::Value;

    struct NamedMetric(&'static str);

    impl Metric for NamedMetric {
        fn name(&self) -> &str {
            self.0
        }

        fn calc(&self, _actual: &[Value], _predicted: &[Value]) -> Result<f64> {
            Ok(0.0)
        }
    }

    #[test]
    fn test_standard_registry() {
        let registry = Registry::standard(42).unwrap();

        assert_eq!(registry.datasets().len(), 5);
        assert_eq!(registry.algorithms().len(), 5);
        assert_eq!(registry.metrics().len(), 2);
        assert_eq!(registry.fairness_metrics().len(), 3);
        assert_eq!(registry.dataset_names()[0], "synthetic");
    }

    #[test]
    fn test_duplicate_algorithm_rejected() {
        let result = Registry::new(
            standard_datasets(),
            vec![Box::new(MajorityBaseline::new()), Box::new(MajorityBaseline::new())],
            standard_metrics(),
            vec![],
        );
        assert!(matches!(result, Err(Error::DuplicateName(_))));
    }

    #[test]
    fn test_duplicate_metric_across_registries_rejected() {
        let result = Registry::new(
            vec![],
            vec![],
            vec![Box::new(NamedMetric("DIbinary"))],
            vec![Box::new(DisparateImpact)],
        );
        assert!(matches!(result, Err(Error::DuplicateName(_))));
    }

    #[test]
    fn test_expanded_fairness_key_collision_rejected() {
        let dataset = DatasetDescriptor::new("d", "y", "1").with_sensitive("sex", &["m"]);
        let result = Registry::new(
            vec![dataset],
            vec![],
            vec![Box::new(Accuracy), Box::new(NamedMetric("DIbinary-sex"))],
            vec![Box::new(DisparateImpact)],
        );
        assert!(matches!(result, Err(Error::DuplicateName(_))));
    }

    #[test]
    fn test_fairness_metric_key() {
        assert_eq!(fairness_metric_key("CV", "race"), "CV-race");
    }
}
