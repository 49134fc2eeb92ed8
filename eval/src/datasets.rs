// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Dataset descriptors, processed datasets and train/test split generation

use crate::error::{Error, Result};
use crate::table::{Column, Table, Value};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Fraction of rows assigned to the training side of each split
pub const DEFAULT_TRAIN_FRACTION: f64 = 2.0 / 3.0;

/// Where the rows of a dataset come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataSource {
    /// Preprocessed CSV files `<name>_processed.csv` and `<name>_numerical.csv`
    Csv,
    /// Generated in memory
    Synthetic { rows: usize, seed: u64 },
}

/// Static metadata about one dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    name: String,
    class_attribute: String,
    sensitive_attributes: Vec<String>,
    privileged_values: BTreeMap<String, Vec<Value>>,
    positive_class: Value,
    source: DataSource,
}

impl DatasetDescriptor {
    pub fn new(name: &str, class_attribute: &str, positive_class: &str) -> Self {
        Self {
            name: name.to_string(),
            class_attribute: class_attribute.to_string(),
            sensitive_attributes: Vec::new(),
            privileged_values: BTreeMap::new(),
            positive_class: Value::parse(positive_class),
            source: DataSource::Csv,
        }
    }

    /// Add a sensitive attribute together with its privileged values
    pub fn with_sensitive(mut self, attribute: &str, privileged: &[&str]) -> Self {
        self.sensitive_attributes.push(attribute.to_string());
        self.privileged_values.insert(
            attribute.to_string(),
            privileged.iter().map(|p| Value::parse(p)).collect(),
        );
        self
    }

    pub fn with_source(mut self, source: DataSource) -> Self {
        self.source = source;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_attribute(&self) -> &str {
        &self.class_attribute
    }

    pub fn sensitive_attributes(&self) -> &[String] {
        &self.sensitive_attributes
    }

    pub fn privileged_class_values(&self) -> &BTreeMap<String, Vec<Value>> {
        &self.privileged_values
    }

    /// Privileged values of one sensitive attribute (empty if unknown)
    pub fn privileged_values_for(&self, attribute: &str) -> &[Value] {
        self.privileged_values
            .get(attribute)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn positive_class_value(&self) -> &Value {
        &self.positive_class
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Class and sensitive attribute names; these are never one-hot encoded
    fn protected_columns(&self) -> Vec<&str> {
        std::iter::once(self.class_attribute.as_str())
            .chain(self.sensitive_attributes.iter().map(String::as_str))
            .collect()
    }
}

/// Datasets known to the harness, in evaluation order
pub fn standard_datasets() -> Vec<DatasetDescriptor> {
    vec![
        DatasetDescriptor::new("synthetic", "outcome", "1")
            .with_sensitive("sex", &["male"])
            .with_source(DataSource::Synthetic { rows: 600, seed: 42 }),
        DatasetDescriptor::new("ricci", "Class", "1").with_sensitive("Race", &["W"]),
        DatasetDescriptor::new("adult", "income-per-year", ">50K")
            .with_sensitive("race", &["White"])
            .with_sensitive("sex", &["Male"]),
        DatasetDescriptor::new("german", "credit", "1")
            .with_sensitive("sex", &["male"])
            .with_sensitive("age", &["adult"]),
        DatasetDescriptor::new("propublica-recidivism", "two_year_recid", "0")
            .with_sensitive("sex", &["Female"])
            .with_sensitive("race", &["Caucasian"]),
    ]
}

/// Split generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Base seed; trial `i` shuffles with `seed + i`
    pub seed: u64,
    /// Fraction of rows on the training side, strictly between 0 and 1
    pub train_fraction: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            train_fraction: DEFAULT_TRAIN_FRACTION,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "train fraction must be strictly between 0 and 1, got {}",
                self.train_fraction
            )));
        }
        Ok(())
    }
}

/// One train/test partition of a table
#[derive(Debug, Clone)]
pub struct Split {
    pub trial: usize,
    pub train: Table,
    pub test: Table,
    /// Source row indices of the training side
    pub train_rows: Vec<usize>,
    /// Source row indices of the test side
    pub test_rows: Vec<usize>,
}

/// Row permutation for one trial; depends only on seed, trial index and row count
pub fn trial_permutation(num_rows: usize, seed: u64, trial: usize) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(trial as u64));
    let mut rows: Vec<usize> = (0..num_rows).collect();
    rows.shuffle(&mut rng);
    rows
}

/// A dataset ready for benchmarking: full-feature rows plus a numerical variant
#[derive(Debug, Clone)]
pub struct ProcessedData {
    descriptor: DatasetDescriptor,
    full: Table,
    numerical: Table,
}

impl ProcessedData {
    pub fn new(descriptor: DatasetDescriptor, full: Table, numerical: Table) -> Result<Self> {
        if full.is_empty() {
            return Err(Error::DatasetLoad {
                dataset: descriptor.name.clone(),
                reason: "dataset has no rows".to_string(),
            });
        }
        if full.num_rows() != numerical.num_rows() {
            return Err(Error::DatasetLoad {
                dataset: descriptor.name.clone(),
                reason: format!(
                    "full table has {} rows but numerical table has {}",
                    full.num_rows(),
                    numerical.num_rows()
                ),
            });
        }

        for column in descriptor.protected_columns() {
            full.require_column(column)?;
            numerical.require_column(column)?;
        }

        Ok(Self {
            descriptor,
            full,
            numerical,
        })
    }

    /// Build from a full-feature table, deriving the numerical variant
    pub fn from_full(descriptor: DatasetDescriptor, full: Table) -> Result<Self> {
        let numerical = full.to_numerical(&descriptor.protected_columns());
        Self::new(descriptor, full, numerical)
    }

    /// Load a dataset according to its descriptor's source
    pub fn open(descriptor: &DatasetDescriptor, data_dir: &Path) -> Result<Self> {
        match descriptor.source {
            DataSource::Csv => Self::load(descriptor, data_dir),
            DataSource::Synthetic { rows, seed } => Self::synthetic(descriptor, rows, seed),
        }
    }

    /// Load preprocessed CSV files from `data_dir`.
    ///
    /// When `<name>_numerical.csv` is absent the numerical variant is derived
    /// from the processed file.
    pub fn load(descriptor: &DatasetDescriptor, data_dir: &Path) -> Result<Self> {
        let processed_path = data_dir.join(format!("{}_processed.csv", descriptor.name));
        let numerical_path = data_dir.join(format!("{}_numerical.csv", descriptor.name));

        let full = Self::read_csv(descriptor, &processed_path)?;

        if numerical_path.exists() {
            let numerical = Self::read_csv(descriptor, &numerical_path)?;
            tracing::debug!("Loaded numerical variant from {}", numerical_path.display());
            Self::new(descriptor.clone(), full, numerical)
        } else {
            tracing::debug!(
                "No numerical file for {}, deriving it by one-hot encoding",
                descriptor.name
            );
            Self::from_full(descriptor.clone(), full)
        }
    }

    fn read_csv(descriptor: &DatasetDescriptor, path: &Path) -> Result<Table> {
        let file = File::open(path).map_err(|e| Error::DatasetLoad {
            dataset: descriptor.name.clone(),
            reason: format!("cannot open {} ({}); run preprocessing first", path.display(), e),
        })?;
        Table::from_csv_reader(file)
    }

    /// Generate a seeded synthetic dataset for development and testing.
    ///
    /// One group column is drawn per sensitive attribute, taking that
    /// attribute's first privileged value or `non-<value>`. Outcomes depend on
    /// education and hours, with a built-in advantage for privileged rows so
    /// fairness metrics have something to measure.
    pub fn synthetic(descriptor: &DatasetDescriptor, rows: usize, seed: u64) -> Result<Self> {
        let attributes = &descriptor.sensitive_attributes;
        if attributes.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "synthetic dataset '{}' needs at least one sensitive attribute",
                descriptor.name
            )));
        }

        let groups = attributes
            .iter()
            .map(|attribute| {
                let privileged = descriptor.privileged_values_for(attribute).first().cloned().ok_or_else(|| {
                    Error::InvalidConfig(format!("sensitive attribute '{}' has no privileged value", attribute))
                })?;
                let unprivileged = Value::Cat(format!("non-{}", privileged));
                Ok((privileged, unprivileged))
            })
            .collect::<Result<Vec<_>>>()?;

        let positive = descriptor.positive_class.clone();
        let negative = match &positive {
            Value::Num(v) => Value::Num(1.0 - v),
            Value::Cat(s) => Value::Cat(format!("not-{}", s)),
        };

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let educations = ["high-school", "college", "graduate"];

        let mut age = Vec::with_capacity(rows);
        let mut education = Vec::with_capacity(rows);
        let mut hours = Vec::with_capacity(rows);
        let mut group_values: Vec<Vec<Value>> = vec![Vec::with_capacity(rows); groups.len()];
        let mut outcome = Vec::with_capacity(rows);

        for _ in 0..rows {
            let mut privileged_count = 0;
            for ((privileged, unprivileged), values) in groups.iter().zip(group_values.iter_mut()) {
                if rng.gen_bool(0.5) {
                    privileged_count += 1;
                    values.push(privileged.clone());
                } else {
                    values.push(unprivileged.clone());
                }
            }
            let edu_idx = rng.gen_range(0..educations.len());
            let worked: f64 = rng.gen_range(10.0..60.0);

            let mut score = 0.2 * edu_idx as f64 + (worked - 35.0) / 50.0;
            score += 0.2 * privileged_count as f64 / groups.len() as f64;
            let favourable = rng.gen_bool((0.35 + score).clamp(0.05, 0.95));

            age.push(Value::Num(rng.gen_range(18..70) as f64));
            education.push(Value::Cat(educations[edu_idx].to_string()));
            hours.push(Value::Num(worked.round()));
            outcome.push(if favourable { positive.clone() } else { negative.clone() });
        }

        let protected = descriptor.protected_columns();
        let mut columns: Vec<Column> = [
            Column::new("age", age),
            Column::new("education", education),
            Column::new("hours-per-week", hours),
        ]
        .into_iter()
        .filter(|column| !protected.contains(&column.name.as_str()))
        .collect();
        columns.extend(
            attributes
                .iter()
                .zip(group_values)
                .map(|(attribute, values)| Column::new(attribute, values)),
        );
        columns.push(Column::new(&descriptor.class_attribute, outcome));

        Self::from_full(descriptor.clone(), Table::new(columns)?)
    }

    pub fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    pub fn full(&self) -> &Table {
        &self.full
    }

    pub fn numerical(&self) -> &Table {
        &self.numerical
    }

    pub fn num_rows(&self) -> usize {
        self.full.num_rows()
    }

    /// Create `num_trials` paired (full, numerical) train/test splits.
    ///
    /// Trial `i` uses one permutation for both shapes, so `full[i]` and
    /// `numerical[i]` partition exactly the same rows.
    pub fn create_train_test_splits(
        &self,
        num_trials: usize,
        config: &SplitConfig,
    ) -> Result<(Vec<Split>, Vec<Split>)> {
        if num_trials < 1 {
            return Err(Error::InvalidTrialCount(num_trials));
        }
        config.validate()?;

        let n = self.num_rows();
        let train_len = (n as f64 * config.train_fraction).floor() as usize;
        if train_len == 0 || train_len == n {
            return Err(Error::InvalidConfig(format!(
                "train fraction {} leaves an empty side for {} rows ({} train)",
                config.train_fraction, n, train_len
            )));
        }

        let mut full_splits = Vec::with_capacity(num_trials);
        let mut numerical_splits = Vec::with_capacity(num_trials);

        for trial in 0..num_trials {
            let permutation = trial_permutation(n, config.seed, trial);
            let (train_rows, test_rows) = permutation.split_at(train_len);

            for (table, splits) in [
                (&self.full, &mut full_splits),
                (&self.numerical, &mut numerical_splits),
            ] {
                splits.push(Split {
                    trial,
                    train: table.select_rows(train_rows),
                    test: table.select_rows(test_rows),
                    train_rows: train_rows.to_vec(),
                    test_rows: test_rows.to_vec(),
                });
            }
        }

        tracing::debug!(
            "Created {} splits for {} ({} train / {} test rows)",
            num_trials,
            self.descriptor.name,
            train_len,
            n - train_len
        );

        Ok((full_splits, numerical_splits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn synthetic_data(rows: usize) -> ProcessedData {
        let descriptor = DatasetDescriptor::new("synthetic", "outcome", "1").with_sensitive("sex", &["male"]);
        ProcessedData::synthetic(&descriptor, rows, 7).unwrap()
    }

    #[test]
    fn test_descriptor_accessors() {
        let adult = standard_datasets()
            .into_iter()
            .find(|d| d.name() == "adult")
            .unwrap();

        assert_eq!(adult.class_attribute(), "income-per-year");
        assert_eq!(adult.sensitive_attributes(), &["race".to_string(), "sex".to_string()]);
        assert_eq!(adult.privileged_values_for("sex"), &[Value::Cat("Male".to_string())]);
        assert_eq!(adult.positive_class_value(), &Value::Cat(">50K".to_string()));
        assert!(adult.privileged_values_for("age").is_empty());
    }

    #[test]
    fn test_standard_dataset_names_unique() {
        let datasets = standard_datasets();
        let names: HashSet<_> = datasets.iter().map(|d| d.name()).collect();
        assert_eq!(names.len(), datasets.len());
    }

    #[test]
    fn test_synthetic_dataset() {
        let data = synthetic_data(100);

        assert_eq!(data.num_rows(), 100);
        assert_eq!(data.numerical().num_rows(), 100);
        assert!(data.full().has_column("education"));
        assert!(!data.numerical().has_column("education"));
        assert!(data.numerical().has_column("sex"));
        assert!(data.numerical().has_column("outcome"));
    }

    #[test]
    fn test_synthetic_one_column_per_sensitive_attribute() {
        let descriptor = DatasetDescriptor::new("synthetic2", "outcome", "1")
            .with_sensitive("sex", &["male"])
            .with_sensitive("race", &["white"])
            .with_source(DataSource::Synthetic { rows: 50, seed: 1 });
        let data = ProcessedData::open(&descriptor, Path::new("unused")).unwrap();

        for (attribute, privileged) in [("sex", "male"), ("race", "white")] {
            let column = data.full().column(attribute).unwrap();
            let privileged = Value::from(privileged);
            let unprivileged = Value::Cat(format!("non-{}", privileged));
            assert!(column.iter().all(|v| *v == privileged || *v == unprivileged));
            assert!(column.contains(&privileged));
            assert!(column.contains(&unprivileged));
            assert!(data.numerical().has_column(attribute));
        }
        assert_eq!(data.full().num_columns(), 6);
    }

    #[test]
    fn test_synthetic_requires_sensitive_attribute() {
        let descriptor = DatasetDescriptor::new("plain", "outcome", "1");
        assert!(matches!(
            ProcessedData::synthetic(&descriptor, 20, 1),
            Err(Error::InvalidConfig(_))
        ));

        let no_privileged = DatasetDescriptor::new("plain", "outcome", "1").with_sensitive("sex", &[]);
        assert!(matches!(
            ProcessedData::synthetic(&no_privileged, 20, 1),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_synthetic_sensitive_attribute_replaces_feature() {
        let descriptor = DatasetDescriptor::new("aged", "outcome", "1").with_sensitive("age", &["adult"]);
        let data = ProcessedData::synthetic(&descriptor, 30, 3).unwrap();

        let age = data.full().column("age").unwrap();
        assert!(age.iter().all(|v| !v.is_numeric()));
        assert_eq!(data.full().num_columns(), 4);
    }

    #[test]
    fn test_synthetic_is_reproducible() {
        let a = synthetic_data(50);
        let b = synthetic_data(50);
        assert_eq!(a.full(), b.full());
    }

    #[test]
    fn test_splits_partition_rows() {
        let data = synthetic_data(30);
        let (full, numerical) = data.create_train_test_splits(3, &SplitConfig::default()).unwrap();

        assert_eq!(full.len(), 3);
        assert_eq!(numerical.len(), 3);

        for (f, n) in full.iter().zip(numerical.iter()) {
            assert_eq!(f.train.num_rows(), 20);
            assert_eq!(f.test.num_rows(), 10);
            assert_eq!(f.train_rows, n.train_rows);
            assert_eq!(f.test_rows, n.test_rows);

            let mut all: Vec<usize> = f.train_rows.iter().chain(f.test_rows.iter()).copied().collect();
            all.sort_unstable();
            assert_eq!(all, (0..30).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_split_rows_match_source() {
        let data = synthetic_data(12);
        let (full, _) = data.create_train_test_splits(1, &SplitConfig::default()).unwrap();
        let split = &full[0];

        let source_age = data.full().column("age").unwrap();
        let test_age = split.test.column("age").unwrap();
        for (pos, &row) in split.test_rows.iter().enumerate() {
            assert_eq!(test_age[pos], source_age[row]);
        }
    }

    #[test]
    fn test_invalid_trial_count() {
        let data = synthetic_data(10);
        let result = data.create_train_test_splits(0, &SplitConfig::default());
        assert!(matches!(result, Err(Error::InvalidTrialCount(0))));
    }

    #[test]
    fn test_invalid_train_fraction() {
        let data = synthetic_data(10);
        let config = SplitConfig { seed: 1, train_fraction: 1.0 };
        assert!(matches!(
            data.create_train_test_splits(2, &config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_train_fraction_leaving_empty_side() {
        let data = synthetic_data(10);
        let config = SplitConfig { seed: 1, train_fraction: 0.05 };
        assert!(matches!(
            data.create_train_test_splits(2, &config),
            Err(Error::InvalidConfig(_))
        ));

        let config = SplitConfig { seed: 1, train_fraction: 0.1 };
        let (full, _) = data.create_train_test_splits(1, &config).unwrap();
        assert_eq!(full[0].train_rows.len(), 1);
    }

    #[test]
    fn test_new_rejects_empty_dataset() {
        let descriptor = DatasetDescriptor::new("empty", "y", "1").with_sensitive("s", &["a"]);
        let full = Table::new(vec![Column::parsed("s", &[]), Column::parsed("y", &[])]).unwrap();

        assert!(matches!(
            ProcessedData::from_full(descriptor, full),
            Err(Error::DatasetLoad { .. })
        ));
    }

    #[test]
    fn test_trial_permutation_seeding() {
        assert_eq!(trial_permutation(20, 42, 3), trial_permutation(20, 42, 3));
        assert_ne!(trial_permutation(20, 42, 0), trial_permutation(20, 42, 1));
    }

    #[test]
    fn test_new_rejects_mismatched_tables() {
        let descriptor = DatasetDescriptor::new("tiny", "y", "1").with_sensitive("s", &["a"]);
        let full = Table::new(vec![Column::parsed("s", &["a", "b"]), Column::parsed("y", &["1", "0"])]).unwrap();
        let numerical = full.select_rows(&[0]);

        assert!(matches!(
            ProcessedData::new(descriptor, full, numerical),
            Err(Error::DatasetLoad { .. })
        ));
    }

    #[test]
    fn test_new_requires_protected_columns() {
        let descriptor = DatasetDescriptor::new("tiny", "y", "1").with_sensitive("race", &["W"]);
        let full = Table::new(vec![Column::parsed("y", &["1", "0"])]).unwrap();

        assert!(matches!(
            ProcessedData::from_full(descriptor, full),
            Err(Error::MissingColumn(_))
        ));
    }

    #[test]
    fn test_load_csv_derives_numerical() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ricci_processed.csv"),
            "Position,Combine,Race,Class\nCaptain,70.5,W,1\nLieutenant,60.0,B,0\nCaptain,65.2,H,1\n",
        )
        .unwrap();

        let descriptor = DatasetDescriptor::new("ricci", "Class", "1").with_sensitive("Race", &["W"]);
        let data = ProcessedData::open(&descriptor, dir.path()).unwrap();

        assert_eq!(data.num_rows(), 3);
        assert!(data.numerical().has_column("Position_Captain"));
        assert_eq!(data.numerical().column("Race"), data.full().column("Race"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = DatasetDescriptor::new("german", "credit", "1");

        assert!(matches!(
            ProcessedData::load(&descriptor, dir.path()),
            Err(Error::DatasetLoad { .. })
        ));
    }
}
