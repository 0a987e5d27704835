//! Feature preprocessing for the regression pipeline
//!
//! Turns a [`PropertyRecord`] into the dense feature vector the trained
//! regressor expects. Columns are bound by name against the training-time
//! schema: numeric columns pass through (optionally standard-scaled) and
//! categorical columns are one-hot encoded over their fitted vocabulary.
//! A value outside the vocabulary is a hard error.

use crate::models::{column_kind, Cell, ColumnKind, PropertyRecord};
use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One column of the training-time schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(flatten)]
    pub encoding: ColumnEncoding,
}

/// How a column is turned into features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnEncoding {
    Numeric {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scale: Option<Scale>,
    },
    Categorical { categories: Vec<String> },
}

impl ColumnEncoding {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnEncoding::Numeric { .. } => ColumnKind::Numeric,
            ColumnEncoding::Categorical { .. } => ColumnKind::Categorical,
        }
    }

    /// Number of features this column expands to
    pub fn width(&self) -> usize {
        match self {
            ColumnEncoding::Numeric { .. } => 1,
            ColumnEncoding::Categorical { categories } => categories.len(),
        }
    }
}

/// Standard scaling fitted at training time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub mean: f64,
    pub std: f64,
}

/// Fitted column transformer
#[derive(Debug, Clone)]
pub struct Preprocessor {
    columns: Vec<ColumnSpec>,
    width: usize,
}

impl Preprocessor {
    /// Build a preprocessor from the schema, rejecting schemas that can never
    /// match a property record
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self> {
        ensure!(!columns.is_empty(), "schema has no columns");

        let mut seen = HashSet::new();
        for column in &columns {
            ensure!(
                seen.insert(column.name.as_str()),
                "column '{}' appears more than once",
                column.name
            );

            let expected = column_kind(&column.name).with_context(|| {
                format!("column '{}' is not a property attribute", column.name)
            })?;
            ensure!(
                expected == column.encoding.kind(),
                "column '{}' is declared {:?} but the property attribute is {:?}",
                column.name,
                column.encoding.kind(),
                expected
            );

            match &column.encoding {
                ColumnEncoding::Numeric { scale: Some(scale) } => {
                    ensure!(
                        scale.mean.is_finite() && scale.std.is_finite() && scale.std != 0.0,
                        "column '{}' has an invalid scale (mean {}, std {})",
                        column.name,
                        scale.mean,
                        scale.std
                    );
                }
                ColumnEncoding::Numeric { scale: None } => {}
                ColumnEncoding::Categorical { categories } => {
                    ensure!(
                        !categories.is_empty(),
                        "column '{}' has an empty vocabulary",
                        column.name
                    );
                    let unique: HashSet<&str> = categories.iter().map(String::as_str).collect();
                    ensure!(
                        unique.len() == categories.len(),
                        "column '{}' lists a category more than once",
                        column.name
                    );
                }
            }
        }

        let width = columns.iter().map(|c| c.encoding.width()).sum();
        Ok(Self { columns, width })
    }

    /// Encoded feature width
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Encode a single record
    pub fn transform(&self, record: &PropertyRecord) -> Result<Vec<f64>> {
        let mut features = Vec::with_capacity(self.width);

        for column in &self.columns {
            let cell = record
                .cell(&column.name)
                .with_context(|| format!("columns are missing: {{'{}'}}", column.name))?;

            match (&column.encoding, cell) {
                (ColumnEncoding::Numeric { scale }, Cell::Number(value)) => {
                    let value = match scale {
                        Some(s) => (value - s.mean) / s.std,
                        None => value,
                    };
                    features.push(value);
                }
                (ColumnEncoding::Categorical { categories }, Cell::Text(value)) => {
                    let position = categories.iter().position(|c| c == value);
                    let Some(position) = position else {
                        bail!(
                            "Found unknown categories ['{}'] in column '{}' during transform",
                            value,
                            column.name
                        );
                    };
                    features.extend((0..categories.len()).map(|i| f64::from(u8::from(i == position))));
                }
                (ColumnEncoding::Numeric { .. }, Cell::Text(value)) => {
                    bail!("column '{}' expects a number, got '{}'", column.name, value);
                }
                (ColumnEncoding::Categorical { .. }, Cell::Number(value)) => {
                    bail!("column '{}' expects a category, got {}", column.name, value);
                }
            }
        }

        Ok(features)
    }
}
