// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Column-oriented tabular data shared by datasets, algorithms and metrics
//!
//! A `Table` holds mixed numeric and categorical cells. The numerically encoded
//! variant used by numerical-only algorithms is derived with one-hot encoding.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Read;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric cell (anything that parses as a finite float)
    Num(f64),
    /// Categorical cell
    Cat(String),
}

impl Value {
    /// Parse raw text, preferring a numeric interpretation.
    ///
    /// Labels and privileged values written as text go through the same rule
    /// as CSV cells, so `"1"` in a descriptor matches a `1` read from disk.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Value::Num(v),
            _ => Value::Cat(trimmed.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Num(v) => Some(*v),
            Value::Cat(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Num(_))
    }

    /// Stable string key, used when values need hashing
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(v) => write!(f, "{}", v),
            Value::Cat(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Num(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::parse(s)
    }
}

/// A named column of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: &str, values: Vec<Value>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }

    /// Build a column by parsing each raw cell
    pub fn parsed(name: &str, raw: &[&str]) -> Self {
        Self::new(name, raw.iter().map(|r| Value::parse(r)).collect())
    }

    pub fn is_numeric(&self) -> bool {
        self.values.iter().all(Value::is_numeric)
    }
}

/// In-memory table; every column holds the same number of rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let num_rows = columns.first().map_or(0, |c| c.values.len());

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
            if column.values.len() != num_rows {
                return Err(Error::InvalidConfig(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name,
                    column.values.len(),
                    num_rows
                )));
            }
        }

        Ok(Self { columns, num_rows })
    }

    /// Read a table from CSV with a header row
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut columns: Vec<Column> = reader
            .headers()?
            .iter()
            .map(|h| Column::new(h, Vec::new()))
            .collect();

        for result in reader.records() {
            let record = result?;
            for (column, field) in columns.iter_mut().zip(record.iter()) {
                column.values.push(Value::parse(field));
            }
        }

        Self::new(columns)
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn require_column(&self, name: &str) -> Result<&[Value]> {
        self.column(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Columns usable as model features: everything except the excluded names
    pub fn feature_columns(&self, excluded: &[&str]) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| !excluded.contains(&c.name.as_str()))
            .collect()
    }

    /// New table holding the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: indices.iter().map(|&i| c.values[i].clone()).collect(),
            })
            .collect();

        Table {
            columns,
            num_rows: indices.len(),
        }
    }

    /// Numerically encoded copy of this table.
    ///
    /// Numeric columns are copied, categorical columns are one-hot encoded as
    /// `<column>_<category>` in first-seen category order. Columns named in
    /// `keep_verbatim` (class and sensitive attributes) are copied unchanged.
    pub fn to_numerical(&self, keep_verbatim: &[&str]) -> Table {
        let mut columns = Vec::new();

        for column in &self.columns {
            if keep_verbatim.contains(&column.name.as_str()) || column.is_numeric() {
                columns.push(column.clone());
                continue;
            }

            let mut categories: Vec<String> = Vec::new();
            let mut index: HashMap<String, usize> = HashMap::new();
            for value in &column.values {
                let key = value.key();
                if !index.contains_key(&key) {
                    index.insert(key.clone(), categories.len());
                    categories.push(key);
                }
            }

            for category in &categories {
                let values = column
                    .values
                    .iter()
                    .map(|v| Value::Num(if &v.key() == category { 1.0 } else { 0.0 }))
                    .collect();
                columns.push(Column {
                    name: format!("{}_{}", column.name, category),
                    values,
                });
            }
        }

        Table {
            columns,
            num_rows: self.num_rows,
        }
    }
}
